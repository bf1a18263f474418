//! PostgreSQL repository.
//!
//! Eligibility is derived: a participant or prize is eligible while no
//! `winners` row references it. Unique constraints on
//! `winners.participant_id` and `winners.prize_id` stop two coordinators
//! sharing the database from awarding the same row twice.

use super::{PoolSnapshot, RaffleRepository, RepositoryError, check_recent_limit};
use crate::entities::participants::{
    InsertManyParticipants, ListEligibleParticipants, ParticipantRecord,
};
use crate::entities::prizes::{InsertManyPrizes, ListEligiblePrizes, PrizeRecord};
use crate::entities::winners::{
    ListRecentWinners, PARTICIPANT_UNIQUE_CONSTRAINT, PRIZE_UNIQUE_CONSTRAINT, WinnerRow,
};
use crate::framework::DatabaseProcessor;
use async_trait::async_trait;
use kanau::processor::Processor;
use raffle_sdk::objects::{
    Participant, ParticipantId, Prize, PrizeId, WinnerId, WinnerRecord,
};
use sqlx::PgPool;
use tracing::{debug, info};

/// Repository backed by a Postgres pool.
pub struct PgRepository {
    processor: DatabaseProcessor,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            processor: DatabaseProcessor::new(pool),
        }
    }

    /// Insert participants and prizes, leaving existing ids untouched.
    ///
    /// Returns the number of `(participants, prizes)` actually inserted.
    pub async fn seed(
        &self,
        participants: Vec<Participant>,
        prizes: Vec<Prize>,
    ) -> Result<(u64, u64), RepositoryError> {
        let participants = self
            .processor
            .process(InsertManyParticipants { participants })
            .await?;
        let prizes = self.processor.process(InsertManyPrizes { prizes }).await?;
        info!(participants, prizes, "Seeded raffle pools");
        Ok((participants, prizes))
    }
}

/// Clamp a window size to Postgres' `BIGINT` range.
fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

/// Map a unique-constraint violation on `winners` to the row that lost
/// the race.
fn map_insert_error(
    err: sqlx::Error,
    participant_id: ParticipantId,
    prize_id: PrizeId,
) -> RepositoryError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            match db_err.constraint() {
                Some(PARTICIPANT_UNIQUE_CONSTRAINT) => {
                    return RepositoryError::ParticipantUnavailable(participant_id);
                }
                Some(PRIZE_UNIQUE_CONSTRAINT) => {
                    return RepositoryError::PrizeUnavailable(prize_id);
                }
                _ => {}
            }
        }
    }
    RepositoryError::Database(err)
}

#[async_trait]
impl RaffleRepository for PgRepository {
    async fn eligible_participants(&self) -> Result<Vec<Participant>, RepositoryError> {
        let rows = self.processor.process(ListEligibleParticipants).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn eligible_prizes(&self) -> Result<Vec<Prize>, RepositoryError> {
        let rows = self.processor.process(ListEligiblePrizes).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn recent_winners(&self, limit: usize) -> Result<Vec<WinnerRecord>, RepositoryError> {
        check_recent_limit(limit)?;
        let rows = self
            .processor
            .process(ListRecentWinners {
                limit: sql_limit(limit),
            })
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[tracing::instrument(skip_all, err, name = "SQL:Snapshot")]
    async fn snapshot(&self, recent_limit: usize) -> Result<PoolSnapshot, RepositoryError> {
        check_recent_limit(recent_limit)?;

        // One read-only repeatable-read transaction so the three lists agree.
        let mut tx = self.processor.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;
        let participants = ParticipantRecord::list_eligible(&mut *tx).await?;
        let prizes = PrizeRecord::list_eligible(&mut *tx).await?;
        let winners = WinnerRow::list_recent(&mut *tx, sql_limit(recent_limit)).await?;
        tx.commit().await?;

        Ok(PoolSnapshot {
            participants: participants.into_iter().map(Into::into).collect(),
            prizes: prizes.into_iter().map(Into::into).collect(),
            recent_winners: winners.into_iter().map(Into::into).collect(),
        })
    }

    #[tracing::instrument(
        skip_all,
        err,
        name = "SQL:CommitDraw",
        fields(participant_id = %participant_id, prize_id = %prize_id)
    )]
    async fn commit_draw(
        &self,
        participant_id: ParticipantId,
        prize_id: PrizeId,
    ) -> Result<WinnerRecord, RepositoryError> {
        // Dropping `tx` on any early return rolls the transaction back.
        let mut tx = self.processor.begin().await?;

        let person = ParticipantRecord::lock_eligible_tx(&mut tx, participant_id)
            .await?
            .ok_or(RepositoryError::ParticipantUnavailable(participant_id))?;
        let prize = PrizeRecord::lock_eligible_tx(&mut tx, prize_id)
            .await?
            .ok_or(RepositoryError::PrizeUnavailable(prize_id))?;

        let inserted = WinnerRow::insert_tx(&mut tx, participant_id, prize_id)
            .await
            .map_err(|e| map_insert_error(e, participant_id, prize_id))?;

        tx.commit()
            .await
            .map_err(|e| map_insert_error(e, participant_id, prize_id))?;

        debug!(winner_id = inserted.id, "Committed draw");

        Ok(WinnerRecord {
            id: WinnerId(inserted.id),
            person: person.into(),
            prize: prize.into(),
            awarded_at: inserted.awarded_at,
        })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::fmt;

    /// Stand-in for a Postgres `23505` error naming a constraint.
    #[derive(Debug)]
    struct UniqueViolation {
        constraint: Option<&'static str>,
    }

    impl fmt::Display for UniqueViolation {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("duplicate key value violates unique constraint")
        }
    }

    impl std::error::Error for UniqueViolation {}

    impl DatabaseError for UniqueViolation {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::UniqueViolation
        }

        fn constraint(&self) -> Option<&str> {
            self.constraint
        }
    }

    fn unique_violation(constraint: Option<&'static str>) -> sqlx::Error {
        sqlx::Error::Database(Box::new(UniqueViolation { constraint }))
    }

    #[test]
    fn test_unique_violations_map_to_conflicts() {
        let participant = ParticipantId(7);
        let prize = PrizeId(3);

        match map_insert_error(
            unique_violation(Some(PARTICIPANT_UNIQUE_CONSTRAINT)),
            participant,
            prize,
        ) {
            RepositoryError::ParticipantUnavailable(id) => assert_eq!(id, participant),
            other => panic!("expected participant conflict, got {other:?}"),
        }

        match map_insert_error(unique_violation(Some(PRIZE_UNIQUE_CONSTRAINT)), participant, prize) {
            RepositoryError::PrizeUnavailable(id) => assert_eq!(id, prize),
            other => panic!("expected prize conflict, got {other:?}"),
        }

        for constraint in [Some("participants_pkey"), None] {
            let err = map_insert_error(unique_violation(constraint), participant, prize);
            assert!(matches!(err, RepositoryError::Database(sqlx::Error::Database(_))));
        }
    }

    #[test]
    fn test_sql_limit_saturates() {
        assert_eq!(sql_limit(5), 5);
        assert_eq!(sql_limit(usize::MAX), i64::MAX);
    }

    #[test]
    fn test_non_database_errors_pass_through() {
        let err = map_insert_error(sqlx::Error::PoolTimedOut, ParticipantId(1), PrizeId(1));
        assert!(matches!(
            err,
            RepositoryError::Database(sqlx::Error::PoolTimedOut)
        ));
    }
}
