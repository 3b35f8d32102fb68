// PrintBench - app/printer.rs
//
// The printer link: machine connection state plus the console transcript.
//
// There is no transport behind the link — commands are composed, validated,
// and recorded, which is the boundary where a serial writer would slot in.
// Keeping the state machine and transcript real means every front-panel
// control has observable behaviour regardless.

use chrono::Utc;
use std::collections::VecDeque;

use crate::core::gcode::{self, JogAxis};
use crate::core::model::{ConsoleDirection, ConsoleEntry, MachineState, PrintSettings};
use crate::util::constants;
use crate::util::error::GcodeError;

/// Connection state and console transcript for one printer.
#[derive(Debug)]
pub struct PrinterLink {
    state: MachineState,
    console: VecDeque<ConsoleEntry>,
    next_seq: u64,
}

impl PrinterLink {
    pub fn new() -> Self {
        Self {
            state: MachineState::Disconnected,
            console: VecDeque::new(),
            next_seq: 0,
        }
    }

    pub fn state(&self) -> &MachineState {
        &self.state
    }

    /// Console transcript, oldest first.
    pub fn console(&self) -> impl Iterator<Item = &ConsoleEntry> {
        self.console.iter()
    }

    pub fn console_len(&self) -> usize {
        self.console.len()
    }

    /// Establish a link. Controllers boot alarmed, so the link lands in
    /// `Alarm` until the user unlocks.
    ///
    /// Returns an error message suitable for the status bar on bad input.
    pub fn connect(&mut self, port: &str, baud: u32) -> Result<(), String> {
        let port = port.trim();
        if port.is_empty() {
            return Err("Port name is empty.".to_string());
        }
        if self.state.is_linked() {
            return Err("Already connected — disconnect first.".to_string());
        }

        self.state = MachineState::Alarm {
            port: port.to_string(),
            baud,
        };
        self.note(format!("Connected to {port} @ {baud} baud (alarm lock active)"));
        tracing::info!(port, baud, "Printer link established");
        Ok(())
    }

    /// Drop the link from any state.
    pub fn disconnect(&mut self) {
        if self.state.is_linked() {
            self.note("Disconnected".to_string());
            tracing::info!("Printer link closed");
        }
        self.state = MachineState::Disconnected;
    }

    /// Clear the controller alarm ($X). Alarm -> Connected.
    pub fn unlock(&mut self) -> Result<(), String> {
        match &self.state {
            MachineState::Disconnected => Err("Not connected.".to_string()),
            MachineState::Connected { .. } => Err("Printer is already unlocked.".to_string()),
            MachineState::Alarm { port, baud } => {
                let (port, baud) = (port.clone(), *baud);
                self.record(ConsoleDirection::Sent, gcode::unlock_command().to_string());
                self.state = MachineState::Connected { port, baud };
                self.note("Alarm cleared — motion enabled".to_string());
                tracing::info!("Printer unlocked");
                Ok(())
            }
        }
    }

    /// Compose and send a jog move using the current settings.
    pub fn jog(
        &mut self,
        axis: JogAxis,
        distance_mm: f64,
        settings: &PrintSettings,
    ) -> Result<(), String> {
        if !self.state.accepts_motion() {
            return Err(match self.state {
                MachineState::Alarm { .. } => "Unlock the printer before jogging.".to_string(),
                _ => "Connect to the printer before jogging.".to_string(),
            });
        }

        let commands = gcode::jog_commands(axis, distance_mm, settings.jog_feed_mm_min)
            .map_err(|e: GcodeError| e.to_string())?;
        self.send(&commands);
        tracing::debug!(%axis, distance_mm, "Jog sent");
        Ok(())
    }

    /// Hand raw command lines to the link, recording each as Sent.
    ///
    /// Requires a link; alarmed links accept commands too (that is how `$X`
    /// itself arrives on a real controller).
    pub fn send(&mut self, lines: &[String]) {
        if !self.state.is_linked() {
            tracing::warn!(count = lines.len(), "Dropping commands: no link");
            return;
        }
        for line in lines {
            self.record(ConsoleDirection::Sent, line.clone());
        }
    }

    /// Append a local annotation to the transcript.
    pub fn note(&mut self, text: String) {
        self.record(ConsoleDirection::Note, text);
    }

    fn record(&mut self, direction: ConsoleDirection, text: String) {
        self.console.push_back(ConsoleEntry {
            seq: self.next_seq,
            timestamp: Utc::now(),
            direction,
            text,
        });
        self.next_seq += 1;

        // Bounded transcript: discard oldest.
        while self.console.len() > constants::MAX_CONSOLE_ENTRIES {
            self.console.pop_front();
        }
    }
}

impl Default for PrinterLink {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connected_link() -> PrinterLink {
        let mut link = PrinterLink::new();
        link.connect("/dev/ttyUSB0", 115_200).unwrap();
        link.unlock().unwrap();
        link
    }

    #[test]
    fn connect_lands_in_alarm_then_unlock_enables_motion() {
        let mut link = PrinterLink::new();
        link.connect("/dev/ttyUSB0", 115_200).unwrap();
        assert!(matches!(link.state(), MachineState::Alarm { .. }));
        assert!(!link.state().accepts_motion());

        link.unlock().unwrap();
        assert!(link.state().accepts_motion());

        // The unlock command itself appears in the transcript.
        assert!(link
            .console()
            .any(|e| e.direction == ConsoleDirection::Sent && e.text == "$X"));
    }

    #[test]
    fn double_connect_and_unlock_are_rejected() {
        let mut link = connected_link();
        assert!(link.connect("/dev/ttyUSB1", 9600).is_err());
        assert!(link.unlock().is_err());
    }

    #[test]
    fn empty_port_is_rejected() {
        let mut link = PrinterLink::new();
        assert!(link.connect("  ", 115_200).is_err());
        assert!(!link.state().is_linked());
    }

    #[test]
    fn jog_requires_unlocked_link() {
        let settings = PrintSettings::default();

        let mut link = PrinterLink::new();
        assert!(link.jog(JogAxis::X, 10.0, &settings).is_err());

        link.connect("/dev/ttyUSB0", 115_200).unwrap();
        assert!(link.jog(JogAxis::X, 10.0, &settings).is_err());

        link.unlock().unwrap();
        link.jog(JogAxis::X, -10.0, &settings).unwrap();

        let sent: Vec<&str> = link
            .console()
            .filter(|e| e.direction == ConsoleDirection::Sent)
            .map(|e| e.text.as_str())
            .collect();
        assert_eq!(sent, vec!["$X", "G91", "G0 X-10.000 F1500", "G90"]);
    }

    #[test]
    fn sequence_numbers_increase_monotonically() {
        let mut link = connected_link();
        link.send(&["G21".to_string(), "G90".to_string()]);

        let seqs: Vec<u64> = link.console().map(|e| e.seq).collect();
        for pair in seqs.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn transcript_is_bounded() {
        let mut link = connected_link();
        for i in 0..(constants::MAX_CONSOLE_ENTRIES + 100) {
            link.send(&[format!("G4 P{i}")]);
        }
        assert_eq!(link.console_len(), constants::MAX_CONSOLE_ENTRIES);
        // Newest entries survive.
        assert!(link
            .console()
            .last()
            .unwrap()
            .text
            .ends_with(&format!("P{}", constants::MAX_CONSOLE_ENTRIES + 99)));
    }

    #[test]
    fn disconnect_from_alarm_clears_state() {
        let mut link = PrinterLink::new();
        link.connect("COM3", 115_200).unwrap();
        link.disconnect();
        assert_eq!(*link.state(), MachineState::Disconnected);
    }
}
