//! Progress bar over the packs of a run

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Progress display for pack preparation
pub struct ProgressDisplay {
    packs_pb: ProgressBar,
}

impl ProgressDisplay {
    /// Create a progress display for `total_packs`; hidden when stderr is not a terminal
    pub fn new(total_packs: u64) -> Self {
        let style = ProgressStyle::default_bar()
            .template("[{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");

        let packs_pb = ProgressBar::new(total_packs);
        packs_pb.set_style(style);
        if !console::Term::stderr().is_term() {
            packs_pb.set_draw_target(ProgressDrawTarget::hidden());
        }
        Self { packs_pb }
    }

    /// A display that never draws
    pub fn hidden() -> Self {
        Self {
            packs_pb: ProgressBar::hidden(),
        }
    }

    /// Record one finished pack
    pub fn pack_done(&self, pack_id: &str) {
        self.packs_pb.set_message(pack_id.to_string());
        self.packs_pb.inc(1);
    }

    pub fn finish(&self) {
        self.packs_pb.finish_and_clear();
    }

    /// Abandon on error
    pub fn abandon(&self) {
        self.packs_pb.abandon();
    }
}
