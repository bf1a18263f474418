use crate::entities::SEED_BATCH_SIZE;
use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;
use raffle_sdk::objects::{Prize, PrizeId};

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct PrizeRecord {
    pub id: i64,
    pub name: String,
    pub description: String,
}

impl From<PrizeRecord> for Prize {
    fn from(value: PrizeRecord) -> Self {
        Prize {
            id: PrizeId(value.id),
            name: value.name,
            description: value.description,
        }
    }
}

impl PrizeRecord {
    /// All prizes without a winner row, ordered by id.
    pub async fn list_eligible<'e, E>(executor: E) -> Result<Vec<Self>, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        sqlx::query_as::<_, PrizeRecord>(
            r#"
            SELECT pr.id, pr.name, pr.description
            FROM prizes pr
            WHERE NOT EXISTS (SELECT 1 FROM winners w WHERE w.prize_id = pr.id)
            ORDER BY pr.id
            "#,
        )
        .fetch_all(executor)
        .await
    }

    /// Lock one prize row for the rest of the transaction.
    ///
    /// Returns `None` if the prize does not exist or has already been
    /// awarded.
    pub async fn lock_eligible_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: PrizeId,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, PrizeRecord>(
            r#"
            SELECT pr.id, pr.name, pr.description
            FROM prizes pr
            WHERE pr.id = $1
              AND NOT EXISTS (SELECT 1 FROM winners w WHERE w.prize_id = pr.id)
            FOR UPDATE OF pr
            "#,
        )
        .bind(id.0)
        .fetch_optional(&mut **tx)
        .await
    }
}

#[derive(Debug, Clone)]
/// Get every prize that has not been awarded yet.
pub struct ListEligiblePrizes;

impl Processor<ListEligiblePrizes> for DatabaseProcessor {
    type Output = Vec<PrizeRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListEligiblePrizes")]
    async fn process(&self, _query: ListEligiblePrizes) -> Result<Vec<PrizeRecord>, sqlx::Error> {
        PrizeRecord::list_eligible(&self.pool).await
    }
}

#[derive(Debug, Clone)]
/// Insert prizes, skipping ids that already exist.
///
/// Returns the number of rows actually inserted.
pub struct InsertManyPrizes {
    pub prizes: Vec<Prize>,
}

impl Processor<InsertManyPrizes> for DatabaseProcessor {
    type Output = u64;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:InsertManyPrizes")]
    async fn process(&self, insert: InsertManyPrizes) -> Result<u64, sqlx::Error> {
        let mut inserted = 0;
        for chunk in insert.prizes.chunks(SEED_BATCH_SIZE) {
            let mut query_builder =
                sqlx::QueryBuilder::<sqlx::Postgres>::new("INSERT INTO prizes (id, name, description) ");
            query_builder.push_values(chunk, |mut b, prize| {
                b.push_bind(prize.id.0)
                    .push_bind(prize.name.clone())
                    .push_bind(prize.description.clone());
            });
            query_builder.push(" ON CONFLICT (id) DO NOTHING");
            inserted += query_builder.build().execute(&self.pool).await?.rows_affected();
        }
        Ok(inserted)
    }
}
