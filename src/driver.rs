//! Frame loop
//!
//! Commits one searched frame at a time and hands each committed frame to a
//! [`FrameSink`]. Rendering, tracing and pacing all live behind that trait so
//! the loop itself stays free of I/O decisions.

use std::io::{self, Write};
use std::thread;
use std::time::Duration;

use glam::Vec2;
use serde::Serialize;

use crate::search::{PreviewPoint, Scorer, SearchOutcome, SearchTree};
use crate::sim::{GameState, PipePair};

/// Log progress every this many frames
const PROGRESS_INTERVAL: u64 = 500;

/// One committed frame, as written to traces
#[derive(Debug, Clone, Serialize)]
pub struct FrameRecord<'a> {
    pub tick: u64,
    pub bird_y: f32,
    pub velocity: f32,
    /// Distance to the nearest obstacle
    pub threat: f32,
    pub threat_point: Vec2,
    pub pass_count: u32,
    pub ground_offset: f32,
    pub pipes: &'a [PipePair],
    /// Where the search expects the bird to be over the coming frames
    pub preview: Vec<PreviewPoint>,
}

impl<'a> FrameRecord<'a> {
    pub fn new(state: &'a GameState, preview: Vec<PreviewPoint>) -> Self {
        Self {
            tick: state.time_ticks,
            bird_y: state.bird.y(),
            velocity: state.bird.velocity,
            threat: state.bird.threat.distance,
            threat_point: state.bird.threat.point,
            pass_count: state.pass_count,
            ground_offset: state.ground_offset,
            pipes: &state.pipes,
            preview,
        }
    }
}

/// Receives every committed frame
pub trait FrameSink {
    fn frame(&mut self, record: &FrameRecord<'_>) -> io::Result<()>;

    /// Called once after the last frame
    fn finish(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<K: FrameSink + ?Sized> FrameSink for Box<K> {
    fn frame(&mut self, record: &FrameRecord<'_>) -> io::Result<()> {
        (**self).frame(record)
    }

    fn finish(&mut self) -> io::Result<()> {
        (**self).finish()
    }
}

/// Discards frames
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl FrameSink for NullSink {
    fn frame(&mut self, _record: &FrameRecord<'_>) -> io::Result<()> {
        Ok(())
    }
}

/// Writes one JSON object per frame, one per line
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> FrameSink for JsonLinesSink<W> {
    fn frame(&mut self, record: &FrameRecord<'_>) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")
    }

    fn finish(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Sleeps a fixed interval after forwarding each frame
#[derive(Debug)]
pub struct Paced<K> {
    inner: K,
    interval: Duration,
}

impl<K: FrameSink> Paced<K> {
    pub fn new(inner: K, interval: Duration) -> Self {
        Self { inner, interval }
    }

    /// Pace at one simulated frame per `time_step` seconds
    pub fn realtime(inner: K, time_step: f32) -> Self {
        Self::new(inner, Duration::from_secs_f32(time_step.max(0.0)))
    }

    pub fn into_inner(self) -> K {
        self.inner
    }
}

impl<K: FrameSink> FrameSink for Paced<K> {
    fn frame(&mut self, record: &FrameRecord<'_>) -> io::Result<()> {
        self.inner.frame(record)?;
        if !self.interval.is_zero() {
            thread::sleep(self.interval);
        }
        Ok(())
    }

    fn finish(&mut self) -> io::Result<()> {
        self.inner.finish()
    }
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Frames committed
    pub frames: u64,
    /// Pipe pairs cleared in the last committed frame
    pub pass_count: u32,
    /// `Exhausted` if the bird had no way to survive, `Found` if the frame
    /// limit was reached first
    pub outcome: SearchOutcome,
}

impl RunSummary {
    pub fn game_over(&self) -> bool {
        self.outcome == SearchOutcome::Exhausted
    }
}

/// Search and commit frames until the bird is doomed or `max_frames` have run
pub fn run<S, K>(tree: &mut SearchTree<S>, sink: &mut K, max_frames: u64) -> io::Result<RunSummary>
where
    S: Scorer,
    K: FrameSink + ?Sized,
{
    log::info!(
        "Run starting: seed {}, depth {}, up to {} frames",
        tree.root_state().seed,
        tree.depth_limit(),
        max_frames
    );

    let mut frames = 0;
    let mut outcome = SearchOutcome::Found;

    while frames < max_frames {
        if tree.search() == SearchOutcome::Exhausted {
            outcome = SearchOutcome::Exhausted;
            break;
        }
        tree.proceed();
        frames += 1;

        let record = FrameRecord::new(tree.root_state(), tree.preview());
        sink.frame(&record)?;

        if frames % PROGRESS_INTERVAL == 0 {
            log::info!(
                "Frame {}: {} pipes passed, {} live nodes",
                frames,
                record.pass_count,
                tree.live_nodes()
            );
        }
    }
    sink.finish()?;

    let summary = RunSummary {
        frames,
        pass_count: tree.root_state().pass_count,
        outcome,
    };
    if summary.game_over() {
        log::info!(
            "Game over after {} frames with {} pipes passed",
            summary.frames,
            summary.pass_count
        );
    } else {
        log::info!(
            "Frame limit reached: {} frames, {} pipes passed",
            summary.frames,
            summary.pass_count
        );
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn tree(config: Config, seed: u64) -> SearchTree {
        let state = GameState::new(&config, seed);
        SearchTree::new(config, state)
    }

    fn shallow_config() -> Config {
        let mut config = Config::default();
        config.search.depth_limit = 12;
        config
    }

    #[test]
    fn test_run_stops_at_frame_limit() {
        let mut tree = tree(shallow_config(), 9);
        let summary = run(&mut tree, &mut NullSink, 25).unwrap();

        assert_eq!(summary.frames, 25);
        assert_eq!(summary.outcome, SearchOutcome::Found);
        assert!(!summary.game_over());
        assert_eq!(tree.root_state().time_ticks, 25);
    }

    #[test]
    fn test_run_reports_game_over() {
        let mut config = shallow_config();
        config.bird.death_distance = 10_000.0;
        let mut tree = tree(config, 9);
        let summary = run(&mut tree, &mut NullSink, 100).unwrap();

        assert_eq!(summary.frames, 0);
        assert!(summary.game_over());
        assert_eq!(summary.pass_count, 0);
    }

    #[test]
    fn test_default_policy_rarely_backtracks() {
        for seed in 0..3 {
            let mut tree = tree(Config::default(), seed);
            let summary = run(&mut tree, &mut NullSink, 400).unwrap();
            assert!(summary.frames > 0);

            let stats = tree.stats();
            assert!(
                stats.expansions < 5 * summary.frames,
                "seed {seed}: {} expansions over {} frames",
                stats.expansions,
                summary.frames
            );
        }
    }

    #[test]
    fn test_json_lines_trace() {
        let mut tree = tree(shallow_config(), 3);
        let mut sink = JsonLinesSink::new(Vec::new());
        run(&mut tree, &mut sink, 10).unwrap();

        let out = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 10);

        for (i, line) in lines.iter().enumerate() {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            assert_eq!(value["tick"], (i + 1) as u64);
            assert_eq!(value["pipes"].as_array().unwrap().len(), 3);
            assert!(value["preview"].is_array());
        }
    }

    #[test]
    fn test_paced_sink_forwards() {
        let mut tree = tree(shallow_config(), 3);
        let mut sink = Paced::new(JsonLinesSink::new(Vec::new()), Duration::ZERO);
        run(&mut tree, &mut sink, 4).unwrap();

        let out = sink.into_inner().into_inner();
        assert_eq!(out.iter().filter(|&&b| b == b'\n').count(), 4);
    }

    #[test]
    fn test_dyn_sink() {
        let mut tree = tree(shallow_config(), 3);
        let sink: &mut dyn FrameSink = &mut NullSink;
        let summary = run(&mut tree, sink, 3).unwrap();
        assert_eq!(summary.frames, 3);
    }
}
