// Sits between every input (remote datagrams, the front panel, the local
// controls) and the core. Inputs never reach the mixer or sequencer directly.

use std::sync::Arc;

use crossbeam_channel::Sender;

use crate::audio::VoiceMixer;
use crate::audio_api::{DrumKit, Mixer};
use crate::controls::VolumeArbitrator;
use crate::remote::{CommandHandler, RemoteCommand};
use crate::sequencer::BeatSequencer;
use crate::shared::{ControlEvent, StatusView};
use crate::stats::{format_summary, IntervalSummary};

pub struct Middle {
    mixer: VoiceMixer,
    sequencer: BeatSequencer,
    arbitrator: Arc<VolumeArbitrator>,
    kit: DrumKit,
    quit_tx: Sender<()>,
}

impl Middle {
    pub fn new(
        mixer: VoiceMixer,
        sequencer: BeatSequencer,
        arbitrator: Arc<VolumeArbitrator>,
        kit: DrumKit,
        quit_tx: Sender<()>,
    ) -> Self {
        Self { mixer, sequencer, arbitrator, kit, quit_tx }
    }

    pub fn handle_event(&self, event: ControlEvent) {
        match event {
            ControlEvent::CycleMode => {
                let mode = self.sequencer.cycle_mode();
                log::info!("mode -> {}", mode.label());
            }
            ControlEvent::Trigger(drum) => self.kit.play(&self.mixer, drum),
            ControlEvent::NudgeTempo(delta) => {
                self.sequencer.nudge_tempo(delta);
            }
            ControlEvent::Quit => self.request_quit(),
        }
    }

    /// Apply one remote command and build its reply.
    pub fn execute(&self, command: RemoteCommand) -> String {
        match command {
            RemoteCommand::Volume(None) => self.mixer.volume().to_string(),
            RemoteCommand::Volume(Some(v)) => {
                self.arbitrator.apply_remote_volume(&self.mixer, v).to_string()
            }
            RemoteCommand::Tempo(None) => self.sequencer.tempo().to_string(),
            RemoteCommand::Tempo(Some(bpm)) => {
                self.sequencer.set_tempo(bpm);
                self.sequencer.tempo().to_string()
            }
            RemoteCommand::Mode(None) => self.sequencer.mode().code().to_string(),
            RemoteCommand::Mode(Some(mode)) => {
                self.sequencer.set_mode(mode);
                mode.code().to_string()
            }
            RemoteCommand::Play(drum) => {
                self.kit.play(&self.mixer, drum);
                "1".to_string()
            }
            RemoteCommand::Stop => {
                log::info!("stop requested remotely");
                self.request_quit();
                "Stopping".to_string()
            }
        }
    }

    pub fn status(&self) -> StatusView {
        StatusView {
            mode: self.sequencer.mode(),
            tempo: self.sequencer.tempo(),
            volume: self.mixer.volume(),
            step: self.sequencer.last_step(),
            active_voices: self.mixer.active_voices(),
            voice_capacity: self.mixer.capacity(),
            silent: self.mixer.is_silent(),
            locked_out: self.arbitrator.is_locked_out(),
        }
    }

    fn request_quit(&self) {
        // one pending request is enough
        let _ = self.quit_tx.try_send(());
    }
}

// One report line: mode, tempo, volume, then the render and poll jitter
pub fn status_line(
    status: &StatusView,
    audio: Option<IntervalSummary>,
    controls: Option<IntervalSummary>,
) -> String {
    format!(
        "MO {} {}bpm vol:{} {} {}",
        status.mode.code(),
        status.tempo,
        status.volume,
        format_summary("Audio", audio),
        format_summary("Controls", controls),
    )
}

impl CommandHandler for Middle {
    fn handle(&self, line: &str) -> String {
        match RemoteCommand::parse(line) {
            Ok(command) => self.execute(command),
            Err(e) => {
                log::debug!("bad command {:?}: {e}", line.trim_end());
                format!("Error: {e}")
            }
        }
    }
}
