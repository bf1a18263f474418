use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;
use raffle_sdk::objects::{
    Participant, ParticipantId, Prize, PrizeId, WinnerId, WinnerRecord,
};

/// Name of the unique constraint on `winners.participant_id`.
pub const PARTICIPANT_UNIQUE_CONSTRAINT: &str = "winners_participant_unique";
/// Name of the unique constraint on `winners.prize_id`.
pub const PRIZE_UNIQUE_CONSTRAINT: &str = "winners_prize_unique";

/// A winner row joined with its participant and prize.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct WinnerRow {
    pub id: i64,
    pub awarded_at: time::OffsetDateTime,
    pub participant_id: i64,
    pub participant_name: String,
    pub participant_email: String,
    pub prize_id: i64,
    pub prize_name: String,
    pub prize_description: String,
}

impl From<WinnerRow> for WinnerRecord {
    fn from(row: WinnerRow) -> Self {
        WinnerRecord {
            id: WinnerId(row.id),
            person: Participant {
                id: ParticipantId(row.participant_id),
                name: row.participant_name,
                email: row.participant_email,
            },
            prize: Prize {
                id: PrizeId(row.prize_id),
                name: row.prize_name,
                description: row.prize_description,
            },
            awarded_at: row.awarded_at,
        }
    }
}

/// Id and timestamp assigned to a freshly inserted winner row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct InsertedWinner {
    pub id: i64,
    pub awarded_at: time::OffsetDateTime,
}

impl WinnerRow {
    /// The `limit` most recent awards, newest first.
    pub async fn list_recent<'e, E>(executor: E, limit: i64) -> Result<Vec<Self>, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        sqlx::query_as::<_, WinnerRow>(
            r#"
            SELECT
                w.id,
                w.awarded_at,
                p.id AS participant_id,
                p.name AS participant_name,
                p.email AS participant_email,
                pr.id AS prize_id,
                pr.name AS prize_name,
                pr.description AS prize_description
            FROM winners w
            JOIN participants p ON p.id = w.participant_id
            JOIN prizes pr ON pr.id = w.prize_id
            ORDER BY w.awarded_at DESC, w.id DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(executor)
        .await
    }

    /// Append a winner row within a transaction.
    ///
    /// The award timestamp is taken from the database clock (UTC).
    pub async fn insert_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        participant_id: ParticipantId,
        prize_id: PrizeId,
    ) -> Result<InsertedWinner, sqlx::Error> {
        sqlx::query_as::<_, InsertedWinner>(
            r#"
            INSERT INTO winners (participant_id, prize_id)
            VALUES ($1, $2)
            RETURNING id, awarded_at
            "#,
        )
        .bind(participant_id.0)
        .bind(prize_id.0)
        .fetch_one(&mut **tx)
        .await
    }
}

#[derive(Debug, Clone)]
/// Get the most recent awards, newest first.
pub struct ListRecentWinners {
    pub limit: i64,
}

impl Processor<ListRecentWinners> for DatabaseProcessor {
    type Output = Vec<WinnerRow>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListRecentWinners")]
    async fn process(&self, query: ListRecentWinners) -> Result<Vec<WinnerRow>, sqlx::Error> {
        WinnerRow::list_recent(&self.pool, query.limit).await
    }
}
