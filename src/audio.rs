//! Background-music sibling of the quiz engine.
//!
//! The player owns playlist position and the mute flag, nothing else. It
//! observes session status transitions and answers with a directive telling
//! the host which track to put on or to stop; decoding and actual playback
//! are someone else's job. The engine never waits on it.

use std::fs;
use std::path::PathBuf;

use log::debug;
use rand::Rng;
use serde::Deserialize;

use crate::data::LoadError;
use crate::models::GameStatus;

/// Playlist configuration, loadable from a JSON file. Every field has a
/// default so a partial config is fine.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BgmConfig {
    /// Directory the track names are resolved against.
    pub folder: PathBuf,
    /// Track file names inside `folder`, in playlist order.
    pub tracks: Vec<String>,
    /// Start music when a session starts.
    pub auto_play: bool,
    /// Pick the next track at random instead of cycling in order.
    pub random: bool,
    pub default_volume: f32,
}

impl Default for BgmConfig {
    fn default() -> Self {
        Self {
            folder: PathBuf::from("./bgm"),
            tracks: Vec::new(),
            auto_play: true,
            random: true,
            default_volume: 0.5,
        }
    }
}

impl BgmConfig {
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Volume clamped to the playable range.
    pub fn volume(&self) -> f32 {
        self.default_volume.clamp(0.0, 1.0)
    }
}

/// What the host should do with its audio output. `volume` is already
/// clamped to the playable range.
#[derive(Debug, Clone, PartialEq)]
pub enum BgmDirective {
    Play { track: PathBuf, volume: f32 },
    Stop,
}

/// Track-cycling state machine. Feed it status transitions via
/// [`BgmPlayer::on_status`] and end-of-track notifications via
/// [`BgmPlayer::track_ended`]; it hands back directives.
pub struct BgmPlayer {
    config: BgmConfig,
    current: Option<usize>,
    muted: bool,
}

impl BgmPlayer {
    pub fn new(config: BgmConfig) -> Self {
        Self {
            config,
            current: None,
            muted: false,
        }
    }

    /// React to a session status transition: play on `InProgress`, stop on
    /// anything else.
    pub fn on_status<R: Rng>(&mut self, status: GameStatus, rng: &mut R) -> Option<BgmDirective> {
        match status {
            GameStatus::InProgress => {
                if !self.config.auto_play || self.current.is_some() {
                    return None;
                }
                self.play_next(rng)
            }
            GameStatus::NotStarted | GameStatus::Finished => self.stop(),
        }
    }

    /// The current track finished; pick the follow-up (random or sequential,
    /// wrapping around).
    pub fn track_ended<R: Rng>(&mut self, rng: &mut R) -> Option<BgmDirective> {
        if self.current.is_none() {
            return None;
        }
        self.play_next(rng)
    }

    fn play_next<R: Rng>(&mut self, rng: &mut R) -> Option<BgmDirective> {
        let count = self.config.tracks.len();
        if count == 0 {
            return None;
        }
        let next = if self.config.random {
            rng.random_range(0..count)
        } else {
            self.current.map_or(0, |i| (i + 1) % count)
        };
        self.current = Some(next);
        let track = self.config.folder.join(&self.config.tracks[next]);
        debug!("bgm: switching to {}", track.display());
        Some(BgmDirective::Play {
            track,
            volume: self.config.volume(),
        })
    }

    fn stop(&mut self) -> Option<BgmDirective> {
        self.current.take().map(|_| BgmDirective::Stop)
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn toggle_muted(&mut self) -> bool {
        self.muted = !self.muted;
        self.muted
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn current_track(&self) -> Option<PathBuf> {
        self.current
            .map(|i| self.config.folder.join(&self.config.tracks[i]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn config(tracks: &[&str], random: bool) -> BgmConfig {
        BgmConfig {
            folder: PathBuf::from("/music"),
            tracks: tracks.iter().map(|t| t.to_string()).collect(),
            random,
            ..BgmConfig::default()
        }
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn starts_playing_when_session_starts() {
        let mut player = BgmPlayer::new(config(&["a.m4a", "b.mp3"], false));
        let directive = player.on_status(GameStatus::InProgress, &mut rng());
        assert_eq!(
            directive,
            Some(BgmDirective::Play {
                track: PathBuf::from("/music/a.m4a"),
                volume: 0.5,
            })
        );
        assert!(player.current_track().is_some());
    }

    #[test]
    fn stops_when_session_finishes() {
        let mut player = BgmPlayer::new(config(&["a.m4a"], false));
        let mut rng = rng();
        player.on_status(GameStatus::InProgress, &mut rng);
        assert_eq!(
            player.on_status(GameStatus::Finished, &mut rng),
            Some(BgmDirective::Stop)
        );
        assert_eq!(player.current_track(), None);
        // Already stopped: nothing to do.
        assert_eq!(player.on_status(GameStatus::Finished, &mut rng), None);
    }

    #[test]
    fn sequential_mode_cycles_in_order_and_wraps() {
        let mut player = BgmPlayer::new(config(&["a", "b"], false));
        let mut rng = rng();
        player.on_status(GameStatus::InProgress, &mut rng);
        assert_eq!(
            player.track_ended(&mut rng),
            Some(BgmDirective::Play {
                track: PathBuf::from("/music/b"),
                volume: 0.5,
            })
        );
        assert_eq!(
            player.track_ended(&mut rng),
            Some(BgmDirective::Play {
                track: PathBuf::from("/music/a"),
                volume: 0.5,
            })
        );
    }

    #[test]
    fn play_directive_carries_clamped_volume() {
        let cfg = BgmConfig {
            default_volume: 2.5,
            ..config(&["a.m4a"], false)
        };
        let mut player = BgmPlayer::new(cfg);
        match player.on_status(GameStatus::InProgress, &mut rng()) {
            Some(BgmDirective::Play { volume, .. }) => assert_eq!(volume, 1.0),
            other => panic!("expected a play directive, got {:?}", other),
        }
    }

    #[test]
    fn random_mode_stays_within_playlist() {
        let mut player = BgmPlayer::new(config(&["a", "b", "c"], true));
        let mut rng = rng();
        player.on_status(GameStatus::InProgress, &mut rng);
        for _ in 0..20 {
            match player.track_ended(&mut rng) {
                Some(BgmDirective::Play { track, .. }) => {
                    assert!(track.starts_with("/music"));
                }
                other => panic!("expected a play directive, got {:?}", other),
            }
        }
    }

    #[test]
    fn empty_playlist_never_plays() {
        let mut player = BgmPlayer::new(config(&[], true));
        let mut rng = rng();
        assert_eq!(player.on_status(GameStatus::InProgress, &mut rng), None);
        assert_eq!(player.track_ended(&mut rng), None);
    }

    #[test]
    fn auto_play_off_keeps_quiet() {
        let mut cfg = config(&["a"], false);
        cfg.auto_play = false;
        let mut player = BgmPlayer::new(cfg);
        assert_eq!(player.on_status(GameStatus::InProgress, &mut rng()), None);
    }

    #[test]
    fn mute_is_just_a_flag() {
        let mut player = BgmPlayer::new(config(&["a"], false));
        assert!(!player.is_muted());
        assert!(player.toggle_muted());
        player.set_muted(false);
        assert!(!player.is_muted());
    }

    #[test]
    fn restart_while_playing_keeps_the_current_track() {
        let mut player = BgmPlayer::new(config(&["a", "b"], false));
        let mut rng = rng();
        player.on_status(GameStatus::InProgress, &mut rng);
        let playing = player.current_track();
        assert_eq!(player.on_status(GameStatus::InProgress, &mut rng), None);
        assert_eq!(player.current_track(), playing);
    }

    #[test]
    fn config_volume_is_clamped() {
        let mut cfg = BgmConfig::default();
        cfg.default_volume = 2.5;
        assert_eq!(cfg.volume(), 1.0);
        cfg.default_volume = -1.0;
        assert_eq!(cfg.volume(), 0.0);
    }
}
