//! In-memory repository.

use super::{PoolSnapshot, RaffleRepository, RepositoryError, check_recent_limit};
use async_trait::async_trait;
use raffle_sdk::objects::{
    Participant, ParticipantId, Prize, PrizeId, WinnerId, WinnerRecord,
};
use std::collections::BTreeMap;
use time::OffsetDateTime;
use tokio::sync::RwLock;

/// Raffle pools held in process memory.
///
/// Eligible participants and prizes live in id-ordered maps so removal is
/// `O(log n)` and listings come out sorted. The award history is append-only
/// and kept in full; only the read side is windowed. One lock guards all
/// three, so every read sees a consistent snapshot.
pub struct InMemoryRepository {
    pools: RwLock<Pools>,
}

struct Pools {
    participants: BTreeMap<ParticipantId, Participant>,
    prizes: BTreeMap<PrizeId, Prize>,
    /// Oldest first.
    winners: Vec<WinnerRecord>,
    next_winner_id: i64,
}

impl Pools {
    fn recent(&self, limit: usize) -> Vec<WinnerRecord> {
        self.winners.iter().rev().take(limit).cloned().collect()
    }
}

impl InMemoryRepository {
    /// Create a repository with the given initial pools.
    ///
    /// If an id appears twice, the later entry wins.
    pub fn new(
        participants: impl IntoIterator<Item = Participant>,
        prizes: impl IntoIterator<Item = Prize>,
    ) -> Self {
        Self {
            pools: RwLock::new(Pools {
                participants: participants.into_iter().map(|p| (p.id, p)).collect(),
                prizes: prizes.into_iter().map(|p| (p.id, p)).collect(),
                winners: Vec::new(),
                next_winner_id: 1,
            }),
        }
    }

    /// Every award ever made, oldest first.
    pub async fn history(&self) -> Vec<WinnerRecord> {
        self.pools.read().await.winners.clone()
    }
}

#[async_trait]
impl RaffleRepository for InMemoryRepository {
    async fn eligible_participants(&self) -> Result<Vec<Participant>, RepositoryError> {
        Ok(self.pools.read().await.participants.values().cloned().collect())
    }

    async fn eligible_prizes(&self) -> Result<Vec<Prize>, RepositoryError> {
        Ok(self.pools.read().await.prizes.values().cloned().collect())
    }

    async fn recent_winners(&self, limit: usize) -> Result<Vec<WinnerRecord>, RepositoryError> {
        check_recent_limit(limit)?;
        Ok(self.pools.read().await.recent(limit))
    }

    async fn snapshot(&self, recent_limit: usize) -> Result<PoolSnapshot, RepositoryError> {
        check_recent_limit(recent_limit)?;
        let pools = self.pools.read().await;
        Ok(PoolSnapshot {
            participants: pools.participants.values().cloned().collect(),
            prizes: pools.prizes.values().cloned().collect(),
            recent_winners: pools.recent(recent_limit),
        })
    }

    async fn commit_draw(
        &self,
        participant_id: ParticipantId,
        prize_id: PrizeId,
    ) -> Result<WinnerRecord, RepositoryError> {
        let mut pools = self.pools.write().await;

        // Nothing is removed until both lookups have succeeded.
        let person = pools
            .participants
            .get(&participant_id)
            .cloned()
            .ok_or(RepositoryError::ParticipantUnavailable(participant_id))?;
        let prize = pools
            .prizes
            .remove(&prize_id)
            .ok_or(RepositoryError::PrizeUnavailable(prize_id))?;
        pools.participants.remove(&participant_id);

        let record = WinnerRecord {
            id: WinnerId(pools.next_winner_id),
            person,
            prize,
            awarded_at: OffsetDateTime::now_utc(),
        };
        pools.next_winner_id += 1;
        pools.winners.push(record.clone());
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn people(n: i64) -> Vec<Participant> {
        (1..=n)
            .map(|i| Participant {
                id: ParticipantId(i),
                name: format!("Person {i}"),
                email: format!("person{i}@example.com"),
            })
            .collect()
    }

    fn prizes(n: i64) -> Vec<Prize> {
        (1..=n)
            .map(|i| Prize {
                id: PrizeId(i),
                name: format!("Prize {i}"),
                description: format!("Description {i}"),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_commit_moves_pair_into_history() {
        let repo = InMemoryRepository::new(people(3), prizes(2));

        let record = repo.commit_draw(ParticipantId(2), PrizeId(1)).await.unwrap();
        assert_eq!(record.id, WinnerId(1));
        assert_eq!(record.person.id, ParticipantId(2));
        assert_eq!(record.prize.id, PrizeId(1));
        assert_eq!(record.awarded_at.offset(), time::UtcOffset::UTC);

        let remaining: Vec<_> = repo
            .eligible_participants()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(remaining, vec![ParticipantId(1), ParticipantId(3)]);
        assert_eq!(repo.eligible_prizes().await.unwrap().len(), 1);
        assert_eq!(repo.history().await, vec![record]);
    }

    #[tokio::test]
    async fn test_commit_is_all_or_nothing() {
        let repo = InMemoryRepository::new(people(2), prizes(2));
        repo.commit_draw(ParticipantId(1), PrizeId(1)).await.unwrap();

        // Prize 1 is gone: participant 2 must stay eligible.
        let err = repo.commit_draw(ParticipantId(2), PrizeId(1)).await.unwrap_err();
        assert!(matches!(err, RepositoryError::PrizeUnavailable(PrizeId(1))));
        assert_eq!(repo.eligible_participants().await.unwrap().len(), 1);

        // Participant 1 is gone: prize 2 must stay eligible.
        let err = repo.commit_draw(ParticipantId(1), PrizeId(2)).await.unwrap_err();
        assert!(matches!(
            err,
            RepositoryError::ParticipantUnavailable(ParticipantId(1))
        ));
        assert_eq!(repo.eligible_prizes().await.unwrap().len(), 1);
        assert_eq!(repo.history().await.len(), 1);
    }

    #[tokio::test]
    async fn test_recent_winners_window_keeps_full_history() {
        let repo = InMemoryRepository::new(people(7), prizes(7));
        for i in 1..=7 {
            repo.commit_draw(ParticipantId(i), PrizeId(i)).await.unwrap();
        }

        let recent = repo.recent_winners(5).await.unwrap();
        let ids: Vec<_> = recent.iter().map(|w| w.id.0).collect();
        assert_eq!(ids, vec![7, 6, 5, 4, 3]);
        assert_eq!(repo.history().await.len(), 7);

        let err = repo.recent_winners(0).await.unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidRecentLimit));
    }

    #[tokio::test]
    async fn test_snapshot_reads_all_pools() {
        let repo = InMemoryRepository::new(people(5), prizes(4));
        repo.commit_draw(ParticipantId(5), PrizeId(4)).await.unwrap();

        let snapshot = repo.snapshot(5).await.unwrap();
        assert_eq!(snapshot.participants.len(), 4);
        assert_eq!(snapshot.prizes.len(), 3);
        assert_eq!(snapshot.recent_winners.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_seed_ids_collapse() {
        let mut seed = people(2);
        seed.push(Participant {
            id: ParticipantId(1),
            name: "Replacement".into(),
            email: "replacement@example.com".into(),
        });
        let repo = InMemoryRepository::new(seed, prizes(1));

        let participants = repo.eligible_participants().await.unwrap();
        assert_eq!(participants.len(), 2);
        assert_eq!(participants[0].name, "Replacement");
    }
}
