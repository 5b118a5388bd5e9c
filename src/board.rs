use crate::error::AppError;
use crate::ranking::{Ranking, RankingEngine};
use crate::store::RankingStore;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

struct State {
    ranking: Ranking,
    /// Set when a save failed; the store may not match `ranking` any more.
    stale: bool,
}

/// The live ranking plus the store it is persisted to.
///
/// All writers go through [`Leaderboard::mutate`], which holds the lock from
/// the (re)load through the save, so two submissions can never both start
/// from the same snapshot.
pub struct Leaderboard {
    engine: RankingEngine,
    store: Box<dyn RankingStore>,
    state: Mutex<State>,
}

impl Leaderboard {
    pub fn open(engine: RankingEngine, store: Box<dyn RankingStore>) -> Result<Self, AppError> {
        let ranking = engine.normalize(store.load()?);
        debug!(
            backend = store.backend(),
            entries = ranking.len(),
            "loaded leaderboard"
        );
        Ok(Leaderboard {
            engine,
            store,
            state: Mutex::new(State {
                ranking,
                stale: false,
            }),
        })
    }

    pub fn engine(&self) -> &RankingEngine {
        &self.engine
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn read<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&RankingEngine, &Ranking) -> T,
    {
        let state = self.lock();
        f(&self.engine, &state.ranking)
    }

    /// Runs `f` against the current ranking and persists what it returns.
    ///
    /// The in-memory ranking only moves forward once the store accepted the
    /// write. After a failed write the next call reloads from the store
    /// first.
    pub fn mutate<F, T>(&self, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&RankingEngine, &Ranking) -> Result<(Ranking, T), AppError>,
    {
        let mut state = self.lock();
        if state.stale {
            let ranking = self.engine.normalize(self.store.load()?);
            debug!(entries = ranking.len(), "reloaded leaderboard after failed save");
            state.ranking = ranking;
            state.stale = false;
        }

        let (next, value) = f(&self.engine, &state.ranking)?;
        if let Err(e) = self.store.save(next.entries()) {
            warn!(backend = self.store.backend(), error = %e, "failed to persist leaderboard");
            state.stale = true;
            return Err(e.into());
        }
        state.ranking = next;
        Ok(value)
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> Vec<crate::models::leaderboard::Entry> {
        self.read(|engine, ranking| engine.query(ranking).to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::leaderboard::Entry;
    use crate::ranking::Policy;
    use crate::store::{MemoryStore, StoreError};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        fail_next_save: AtomicBool,
        loads: AtomicUsize,
        saves: AtomicUsize,
    }

    impl RankingStore for FlakyStore {
        fn load(&self) -> Result<Vec<Entry>, StoreError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            self.inner.load()
        }

        fn save(&self, entries: &[Entry]) -> Result<(), StoreError> {
            if self.fail_next_save.swap(false, Ordering::SeqCst) {
                return Err(StoreError::Io(std::io::Error::other("disk full")));
            }
            self.inner.save(entries)?;
            self.saves.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn backend(&self) -> &'static str {
            "flaky"
        }
    }

    impl RankingStore for Arc<FlakyStore> {
        fn load(&self) -> Result<Vec<Entry>, StoreError> {
            self.as_ref().load()
        }

        fn save(&self, entries: &[Entry]) -> Result<(), StoreError> {
            self.as_ref().save(entries)
        }

        fn backend(&self) -> &'static str {
            "flaky"
        }
    }

    fn add(board: &Leaderboard, entry: Entry) -> Result<(), AppError> {
        board.mutate(|engine, ranking| {
            let (next, _) = engine.submit(ranking, entry)?;
            Ok((next, ()))
        })
    }

    fn names(entries: &[Entry]) -> Vec<String> {
        entries.iter().map(|e| e.name.clone()).collect()
    }

    #[test]
    fn test_open_normalizes_loaded_entries() {
        let store = MemoryStore::with_entries(
            (0..15).map(|i| Entry::new(format!("p{}", i), i as f64)).collect(),
        );
        let board = Leaderboard::open(RankingEngine::default(), Box::new(store)).unwrap();
        let snapshot = board.snapshot();
        assert_eq!(snapshot.len(), 10);
        assert_eq!(snapshot[0].name, "p14");
    }

    #[test]
    fn test_failed_save_leaves_ranking_and_reloads() {
        let store = Arc::new(FlakyStore::default());
        let board =
            Leaderboard::open(RankingEngine::default(), Box::new(Arc::clone(&store))).unwrap();
        assert_eq!(store.loads.load(Ordering::SeqCst), 1);

        add(&board, Entry::new("ada", 5.0)).unwrap();

        store.fail_next_save.store(true, Ordering::SeqCst);
        let err = add(&board, Entry::new("bob", 9.0)).unwrap_err();
        assert!(matches!(err, AppError::Store(_)));
        assert_eq!(names(&board.snapshot()), ["ada"]);

        add(&board, Entry::new("cy", 7.0)).unwrap();
        assert_eq!(store.loads.load(Ordering::SeqCst), 2);
        assert_eq!(names(&board.snapshot()), ["cy", "ada"]);
        assert_eq!(names(&store.inner.load().unwrap()), ["cy", "ada"]);
    }

    #[test]
    fn test_invalid_input_persists_nothing() {
        let store = Arc::new(FlakyStore::default());
        let board =
            Leaderboard::open(RankingEngine::default(), Box::new(Arc::clone(&store))).unwrap();
        add(&board, Entry::new("ada", 5.0)).unwrap();

        store.fail_next_save.store(true, Ordering::SeqCst);
        assert!(matches!(
            add(&board, Entry::new("", 5.0)),
            Err(AppError::InvalidInput(_))
        ));
        // the armed failure was never consumed
        assert!(store.fail_next_save.load(Ordering::SeqCst));
    }

    #[test]
    fn test_rejected_submission_is_still_saved() {
        let store = Arc::new(FlakyStore::default());
        let engine = RankingEngine::new(Policy::DedupByName, 10);
        let board = Leaderboard::open(engine, Box::new(Arc::clone(&store))).unwrap();
        add(&board, Entry::new("ada", 50.0)).unwrap();
        assert_eq!(store.saves.load(Ordering::SeqCst), 1);

        let outcome = board
            .mutate(|engine, ranking| Ok(engine.submit(ranking, Entry::new("ada", 10.0))?))
            .unwrap();
        assert!(!outcome.is_accepted());
        assert_eq!(store.saves.load(Ordering::SeqCst), 2);

        let stored = store.inner.load().unwrap();
        assert_eq!(names(&stored), ["ada"]);
        assert_eq!(stored[0].score, 50.0);
    }

    #[test]
    fn test_concurrent_submissions_are_not_lost() {
        let engine = RankingEngine::new(Policy::DedupByName, 50);
        let board = Arc::new(Leaderboard::open(engine, Box::new(MemoryStore::new())).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let board = Arc::clone(&board);
                thread::spawn(move || {
                    for i in 0..5 {
                        add(&board, Entry::new(format!("t{}-{}", t, i), f64::from(i))).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(board.snapshot().len(), 40);
    }
}
