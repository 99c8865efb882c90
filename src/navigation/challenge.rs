//! Challenge detection and the mechanical parts of clearing it
//!
//! A challenge is the gate the target site raises to decide whether the
//! requester is human. Detection works off title/content markers; clearing
//! is limited to one scripted best-effort click plus patient waiting.
//! Anything that needs human judgment (visual puzzles) is out of scope:
//! the crawler waits, and fails the attempt when the ceiling is reached.

use crate::config::SiteConfig;

/// State of the challenge gate during one navigation call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChallengeState {
    /// No challenge signals on the page
    None,

    /// Challenge markers found in the title or page source
    Detected,

    /// The automated solve action has been issued
    Solving,

    /// The page left the challenge state within the wait ceiling
    Passed,

    /// The wait ceiling elapsed with the challenge still up
    TimedOut,
}

impl std::fmt::Display for ChallengeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::Detected => "detected",
            Self::Solving => "solving",
            Self::Passed => "passed",
            Self::TimedOut => "timed-out",
        };
        f.write_str(s)
    }
}

/// Classifies pages as challenged or clear from configured markers
#[derive(Debug, Clone)]
pub struct ChallengeProbe {
    title_markers: Vec<String>,
    content_markers: Vec<String>,
}

impl ChallengeProbe {
    /// Builds a probe from the site configuration
    ///
    /// Markers are matched case-insensitively; they are lowercased once here.
    pub fn from_site(site: &SiteConfig) -> Self {
        Self {
            title_markers: site
                .challenge_title_markers
                .iter()
                .map(|m| m.to_lowercase())
                .collect(),
            content_markers: site
                .challenge_content_markers
                .iter()
                .map(|m| m.to_lowercase())
                .collect(),
        }
    }

    /// Classifies the current page into `None` or `Detected`
    pub fn classify(&self, title: &str, source: &str) -> ChallengeState {
        let title = title.to_lowercase();
        if self.title_markers.iter().any(|m| title.contains(m)) {
            return ChallengeState::Detected;
        }

        let source = source.to_lowercase();
        if self.content_markers.iter().any(|m| source.contains(m)) {
            return ChallengeState::Detected;
        }

        ChallengeState::None
    }
}

/// Best-effort solve action: click the first checkbox-like element inside a
/// challenge container, if one is reachable from this document.
pub const SOLVE_SCRIPT: &str = r#"
(function () {
    var candidates = document.querySelectorAll(
        "input[type='checkbox'], #challenge-stage input, .ctp-checkbox-label"
    );
    for (var i = 0; i < candidates.length; i++) {
        var el = candidates[i];
        var rect = el.getBoundingClientRect();
        if (rect.width > 0 && rect.height > 0) {
            el.click();
            return true;
        }
    }
    return false;
})()
"#;

/// Idle-interaction applied on each poll tick while waiting out a challenge.
/// This exists purely to avoid idle-session detection; it does not solve
/// anything.
pub const IDLE_INTERACTION_SCRIPT: &str = r#"
(function () {
    window.scrollBy(0, 40 - Math.floor(Math.random() * 80));
    document.dispatchEvent(new MouseEvent('mousemove', {
        clientX: Math.floor(Math.random() * window.innerWidth),
        clientY: Math.floor(Math.random() * window.innerHeight),
        bubbles: true
    }));
    return true;
})()
"#;
