// Engine context
//
// Owns the store handle, the configuration and the working set. Every
// operator action goes through one of its methods and completes (mutation,
// persistence, re-rank) before the next one starts.

use std::fmt;
use std::path::PathBuf;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::attributes::{apply_batch, BatchOutcome, Command};
use crate::config::Config;
use crate::db::open_db;
use crate::db::rank::rank_query;
use crate::drop_pipeline::{self, DropReport};
use crate::error::{DvrError, Result};
use crate::ingest::discover::discover_recordings;
use crate::ingest::{resolve_candidates, IngestResult};
use crate::metadata::VideoProbe;
use crate::player;
use crate::ranking::{assign_sortkeys, display_order, SortSpec};
use crate::recording::{to_gib, Recording};
use crate::working_set::WorkingSet;

/// Working-set totals shown under the list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total: usize,
    pub dropped: usize,
    pub dropped_gib: f64,
    pub good: usize,
    pub mastered: usize,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} recordings | {} marked for drop ({:.1} GiB) | {} good | {} mastered",
            self.total, self.dropped, self.dropped_gib, self.good, self.mastered
        )
    }
}

pub struct Engine {
    conn: Connection,
    config: Config,
    working: WorkingSet,
    sort: SortSpec,
}

impl Engine {
    /// Open the store named in the config
    pub fn open(config: Config) -> Result<Self> {
        let conn = open_db(&config.database_path)?;
        Ok(Self::with_connection(conn, config))
    }

    pub fn with_connection(conn: Connection, config: Config) -> Self {
        Self {
            conn,
            config,
            working: WorkingSet::new(),
            sort: SortSpec::default(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn sort_spec(&self) -> SortSpec {
        self.sort
    }

    /// Scan the roots and build the working set from them
    pub fn load(&mut self, roots: &[PathBuf], probe: &dyn VideoProbe) -> Result<IngestResult> {
        let candidates = discover_recordings(roots);
        self.load_candidates(&candidates, probe)
    }

    /// Resolve candidates against the store, replace the working set and rank it
    pub fn load_candidates(&mut self, candidates: &[PathBuf], probe: &dyn VideoProbe) -> Result<IngestResult> {
        let (records, result) = resolve_candidates(&self.conn, candidates, probe, &self.config.transliterations)?;
        self.working = WorkingSet::from_records(records);
        self.sort(self.sort)?;
        Ok(result)
    }

    /// Recompute sortkeys and display order over the working set.
    /// Persisted fields are never touched.
    pub fn sort(&mut self, spec: SortSpec) -> Result<()> {
        let ranks = rank_query(&self.conn, &spec, &self.working.basenames())?;
        assign_sortkeys(self.working.iter_mut(), &ranks, spec.scope());
        self.working.reorder(display_order);
        self.sort = spec;
        Ok(())
    }

    /// Re-rank with the current spec, e.g. after a batch changed flags
    pub fn resort(&mut self) -> Result<()> {
        self.sort(self.sort)
    }

    /// Apply a command to the selected basenames, in display order.
    ///
    /// Unknown basenames fail the whole call before anything changes.
    pub fn apply(&mut self, selection: &[String], command: &Command) -> Result<BatchOutcome> {
        if let Some(missing) = selection.iter().find(|b| !self.working.contains(b)) {
            return Err(DvrError::NotFound(format!("Recording '{}'", missing)));
        }

        let selected = self
            .working
            .iter_mut()
            .filter(|r| selection.contains(&r.file_basename));
        let outcome = apply_batch(&self.conn, selected, command)?;

        log::info!(
            "{}: {} changed, {} skipped",
            command,
            outcome.changed.len(),
            outcome.skipped.len()
        );
        Ok(outcome)
    }

    /// Run the drop pipeline over everything currently flagged
    pub fn drop_marked(&mut self) -> Result<DropReport> {
        drop_pipeline::run(
            &self.conn,
            &mut self.working,
            &self.config.ledger_path,
            self.config.delete_files,
        )
    }

    pub fn open_in_player(&self, basename: &str) -> Result<()> {
        let rec = self
            .get(basename)
            .ok_or_else(|| DvrError::NotFound(format!("Recording '{}'", basename)))?;
        player::launch(&self.config.player, &rec.video_path())
    }

    pub fn get(&self, basename: &str) -> Option<&Recording> {
        self.working.get(basename)
    }

    /// Records in display order
    pub fn records(&self) -> impl Iterator<Item = &Recording> {
        self.working.iter()
    }

    pub fn len(&self) -> usize {
        self.working.len()
    }

    pub fn is_empty(&self) -> bool {
        self.working.is_empty()
    }

    /// New positions of a previous selection; evicted basenames are left out.
    pub fn positions_of(&self, selection: &[String]) -> Vec<(String, usize)> {
        selection
            .iter()
            .filter_map(|b| self.working.position(b).map(|pos| (b.clone(), pos)))
            .collect()
    }

    pub fn summary(&self) -> Summary {
        let mut summary = Summary {
            total: self.working.len(),
            ..Default::default()
        };
        let mut dropped_bytes = 0;
        for rec in self.working.iter() {
            if rec.is_dropped {
                summary.dropped += 1;
                dropped_bytes += rec.file_size;
            }
            if rec.is_good {
                summary.good += 1;
            }
            if rec.is_mastered {
                summary.mastered += 1;
            }
        }
        summary.dropped_gib = to_gib(dropped_bytes);
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;
    use crate::db::open_in_memory;
    use crate::db::schema::{load_recording, save_recording};
    use crate::metadata::{NoProbe, VideoProperties};
    use crate::ranking::{SortKey, SortOrder};

    fn write_recording(dir: &Path, basename: &str, title: &str, size: usize) -> PathBuf {
        let video = dir.join(format!("{}.ts", basename));
        std::fs::write(&video, vec![0u8; size]).unwrap();
        std::fs::write(
            dir.join(format!("{}.ts.meta", basename)),
            format!("1:0:19:283D:3FB:1:C00000:0:0:0::Das Erste HD\n{}\n\n", title),
        )
        .unwrap();
        video
    }

    /// Engine over an in-memory store and a populated temp dir
    fn engine_with(tmp: &TempDir, recordings: &[(&str, &str, usize)]) -> Engine {
        for (basename, title, size) in recordings {
            write_recording(tmp.path(), basename, title, *size);
        }
        let config = Config {
            ledger_path: tmp.path().join("dropped"),
            ..Config::default()
        };
        let mut engine = Engine::with_connection(open_in_memory().unwrap(), config);
        engine.load(&[tmp.path().to_path_buf()], &NoProbe).unwrap();
        engine
    }

    fn order(engine: &Engine) -> Vec<String> {
        engine.records().map(|r| r.file_basename.clone()).collect()
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    const NEWS_A: &str = "20230501 2000 - Das Erste HD - News @ 8";
    const TATORT: &str = "20230502 2015 - Das Erste HD - Tatort";
    const NEWS_B: &str = "20230503 2000 - Das Erste HD - News@8";
    const MAUS: &str = "20230504 0930 - Das Erste HD - Maus";

    fn seeded(tmp: &TempDir) -> Engine {
        engine_with(
            tmp,
            &[
                (NEWS_A, "News @ 8", 300),
                (TATORT, "Tatort", 700),
                (NEWS_B, "News@8", 500),
                (MAUS, "Maus", 100),
            ],
        )
    }

    #[test]
    fn test_load_sorts_by_title() {
        let tmp = TempDir::new().unwrap();
        let engine = seeded(&tmp);
        assert_eq!(engine.len(), 4);
        assert_eq!(engine.sort_spec(), SortSpec::default());
        assert_eq!(order(&engine), names(&[MAUS, NEWS_A, NEWS_B, TATORT]));
    }

    #[test]
    fn test_duplicates_adjacent_under_sum_size() {
        let tmp = TempDir::new().unwrap();
        let mut engine = seeded(&tmp);
        engine.sort(SortSpec::new(SortKey::SumSize, SortOrder::Descending)).unwrap();

        // news8 = 800, tatort = 700, maus = 100
        assert_eq!(order(&engine), names(&[NEWS_A, NEWS_B, TATORT, MAUS]));
        let a = engine.get(NEWS_A).unwrap();
        let b = engine.get(NEWS_B).unwrap();
        assert_eq!(a.groupkey, b.groupkey);
        assert_eq!(a.sortkey, b.sortkey);
    }

    #[test]
    fn test_sort_never_touches_store() {
        let tmp = TempDir::new().unwrap();
        let mut engine = seeded(&tmp);
        let before = load_recording(engine.connection(), TATORT).unwrap();

        engine.sort(SortSpec::new(SortKey::Size, SortOrder::Descending)).unwrap();
        assert_eq!(order(&engine)[0], TATORT);
        assert_eq!(load_recording(engine.connection(), TATORT).unwrap(), before);
    }

    #[test]
    fn test_stale_rows_do_not_skew_ranks() {
        let tmp = TempDir::new().unwrap();
        let conn = open_in_memory().unwrap();
        // Row left behind by a recording whose files were removed outside the tool
        let mut stale = crate::recording::tests::sample("20220101 0930 - KiKA - Maus", "Maus", 9_000);
        stale.basepath = tmp.path().join("20220101 0930 - KiKA - Maus");
        save_recording(&conn, &stale).unwrap();

        for (basename, title, size) in [(MAUS, "Maus", 100), (TATORT, "Tatort", 700), (NEWS_A, "News @ 8", 300)] {
            write_recording(tmp.path(), basename, title, size);
        }
        let mut engine = Engine::with_connection(conn, Config::default());
        engine.load(&[tmp.path().to_path_buf()], &NoProbe).unwrap();

        let sortkeys: Vec<i64> = engine.records().map(|r| r.sortkey).collect();
        assert_eq!(sortkeys, vec![1, 2, 3]);
        assert_eq!(order(&engine)[0], MAUS);

        engine.sort(SortSpec::new(SortKey::SumSize, SortOrder::Descending)).unwrap();
        assert_eq!(order(&engine), names(&[TATORT, NEWS_A, MAUS]));

        // The stale row itself is kept
        assert!(load_recording(engine.connection(), &stale.file_basename).unwrap().is_some());
    }

    #[test]
    fn test_apply_and_selection_restore() {
        let tmp = TempDir::new().unwrap();
        let mut engine = seeded(&tmp);
        let selection = names(&[TATORT, MAUS]);

        let outcome = engine.apply(&selection, &"drop".parse().unwrap()).unwrap();
        assert_eq!(outcome.changed.len(), 2);
        assert!(load_recording(engine.connection(), MAUS).unwrap().unwrap().is_dropped);

        engine.sort(SortSpec::new(SortKey::Dropped, SortOrder::Descending)).unwrap();
        let positions = engine.positions_of(&selection);
        // Dropped ones first; tie broken by groupkey
        assert_eq!(positions, vec![(TATORT.to_string(), 1), (MAUS.to_string(), 0)]);
    }

    #[test]
    fn test_apply_unknown_basename_changes_nothing() {
        let tmp = TempDir::new().unwrap();
        let mut engine = seeded(&tmp);
        let err = engine.apply(&names(&[MAUS, "nope"]), &"good".parse().unwrap()).unwrap_err();
        assert!(matches!(err, DvrError::NotFound(_)));
        assert!(!engine.get(MAUS).unwrap().is_good);
    }

    #[test]
    fn test_drop_marked_evicts_and_summary() {
        let tmp = TempDir::new().unwrap();
        let mut engine = seeded(&tmp);
        engine.apply(&names(&[NEWS_A]), &"drop".parse().unwrap()).unwrap();
        engine.apply(&names(&[NEWS_B]), &"master".parse().unwrap()).unwrap();
        engine.apply(&names(&[NEWS_B]), &"drop".parse().unwrap()).unwrap();

        let summary = engine.summary();
        assert_eq!((summary.total, summary.dropped, summary.mastered), (4, 1, 1));

        let report = engine.drop_marked().unwrap();
        assert_eq!(report.dropped, names(&[NEWS_A]));
        assert_eq!(engine.len(), 3);
        assert!(engine.get(NEWS_A).is_none());
        assert!(!tmp.path().join(format!("{}.ts", NEWS_A)).exists());
        assert!(load_recording(engine.connection(), NEWS_A).unwrap().is_none());
        assert_eq!(engine.positions_of(&names(&[NEWS_A])), vec![]);
    }

    #[test]
    fn test_reload_hits_cache_and_keeps_flags() {
        let tmp = TempDir::new().unwrap();
        let mut engine = seeded(&tmp);
        engine.apply(&names(&[TATORT]), &"good".parse().unwrap()).unwrap();

        struct Unreachable;
        impl VideoProbe for Unreachable {
            fn probe(&self, _path: &Path) -> Result<VideoProperties> {
                panic!("cache hit must not probe");
            }
        }

        let result = engine.load(&[tmp.path().to_path_buf()], &Unreachable).unwrap();
        assert_eq!((result.cached, result.created), (4, 0));
        assert!(engine.get(TATORT).unwrap().is_good);
    }

    #[test]
    fn test_summary_display() {
        let summary = Summary { total: 3, dropped: 1, dropped_gib: 2.0, good: 1, mastered: 0 };
        assert_eq!(summary.to_string(), "3 recordings | 1 marked for drop (2.0 GiB) | 1 good | 0 mastered");
    }
}
