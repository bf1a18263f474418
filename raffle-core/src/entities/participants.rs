use crate::entities::SEED_BATCH_SIZE;
use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;
use raffle_sdk::objects::{Participant, ParticipantId};

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ParticipantRecord {
    pub id: i64,
    pub name: String,
    pub email: String,
}

impl From<ParticipantRecord> for Participant {
    fn from(value: ParticipantRecord) -> Self {
        Participant {
            id: ParticipantId(value.id),
            name: value.name,
            email: value.email,
        }
    }
}

impl ParticipantRecord {
    /// All participants without a winner row, ordered by id.
    pub async fn list_eligible<'e, E>(executor: E) -> Result<Vec<Self>, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        sqlx::query_as::<_, ParticipantRecord>(
            r#"
            SELECT p.id, p.name, p.email
            FROM participants p
            WHERE NOT EXISTS (SELECT 1 FROM winners w WHERE w.participant_id = p.id)
            ORDER BY p.id
            "#,
        )
        .fetch_all(executor)
        .await
    }

    /// Lock one participant row for the rest of the transaction.
    ///
    /// Returns `None` if the participant does not exist or has already
    /// been awarded.
    pub async fn lock_eligible_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: ParticipantId,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ParticipantRecord>(
            r#"
            SELECT p.id, p.name, p.email
            FROM participants p
            WHERE p.id = $1
              AND NOT EXISTS (SELECT 1 FROM winners w WHERE w.participant_id = p.id)
            FOR UPDATE OF p
            "#,
        )
        .bind(id.0)
        .fetch_optional(&mut **tx)
        .await
    }
}

#[derive(Debug, Clone)]
/// Get every participant that has not been drawn yet.
pub struct ListEligibleParticipants;

impl Processor<ListEligibleParticipants> for DatabaseProcessor {
    type Output = Vec<ParticipantRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListEligibleParticipants")]
    async fn process(
        &self,
        _query: ListEligibleParticipants,
    ) -> Result<Vec<ParticipantRecord>, sqlx::Error> {
        ParticipantRecord::list_eligible(&self.pool).await
    }
}

#[derive(Debug, Clone)]
/// Insert participants, skipping ids that already exist.
///
/// Returns the number of rows actually inserted.
pub struct InsertManyParticipants {
    pub participants: Vec<Participant>,
}

impl Processor<InsertManyParticipants> for DatabaseProcessor {
    type Output = u64;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:InsertManyParticipants")]
    async fn process(&self, insert: InsertManyParticipants) -> Result<u64, sqlx::Error> {
        let mut inserted = 0;
        for chunk in insert.participants.chunks(SEED_BATCH_SIZE) {
            let mut query_builder =
                sqlx::QueryBuilder::<sqlx::Postgres>::new("INSERT INTO participants (id, name, email) ");
            query_builder.push_values(chunk, |mut b, participant| {
                b.push_bind(participant.id.0)
                    .push_bind(participant.name.clone())
                    .push_bind(participant.email.clone());
            });
            query_builder.push(" ON CONFLICT (id) DO NOTHING");
            inserted += query_builder.build().execute(&self.pool).await?.rows_affected();
        }
        Ok(inserted)
    }
}
