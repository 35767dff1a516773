//! Interactive device picker on the controlling terminal.

use async_trait::async_trait;
use idevctl_shared::device::DeviceRef;
use std::io::{BufRead, Write};
use tokio::select;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::DeviceChooser;
use crate::tui::devices::{Palette, render_choice_prompt, render_devices_table};

#[derive(Debug, PartialEq, Eq)]
pub enum Choice {
    Index(usize),
    Cancel,
    Invalid,
}

/// Interpret one line of operator input. Accepts a 1-based number or a UDID.
pub fn parse_choice(input: &str, devices: &[DeviceRef]) -> Choice {
    let input = input.trim();
    if input.eq_ignore_ascii_case("q") || input.eq_ignore_ascii_case("quit") {
        return Choice::Cancel;
    }
    if let Ok(n) = input.parse::<usize>() {
        if (1..=devices.len()).contains(&n) {
            return Choice::Index(n - 1);
        }
        return Choice::Invalid;
    }
    devices
        .iter()
        .position(|d| !input.is_empty() && d.udid == input)
        .map(Choice::Index)
        .unwrap_or(Choice::Invalid)
}

/// Show the device table and keep asking until the answer is usable.
/// End of input counts as cancellation.
pub fn prompt_for_choice<R, W>(
    devices: &[DeviceRef],
    input: &mut R,
    output: &mut W,
    palette: Palette,
) -> Option<usize>
where
    R: BufRead,
    W: Write,
{
    output
        .write_all(render_devices_table(devices, palette).as_bytes())
        .ok()?;

    let mut line = String::new();
    loop {
        output
            .write_all(render_choice_prompt(devices.len(), palette).as_bytes())
            .ok()?;
        output.flush().ok()?;

        line.clear();
        if input.read_line(&mut line).ok()? == 0 {
            return None;
        }

        match parse_choice(&line, devices) {
            Choice::Index(i) => return Some(i),
            Choice::Cancel => return None,
            Choice::Invalid => {
                writeln!(output, "Invalid selection: {}", line.trim()).ok()?;
            }
        }
    }
}

/// Prompts on stderr and reads stdin. Ctrl+C while waiting cancels.
pub struct TerminalChooser {
    palette: Palette,
    interrupt: CancellationToken,
}

impl TerminalChooser {
    pub fn new(ansi: bool, interrupt: CancellationToken) -> Self {
        Self {
            palette: Palette::new(ansi),
            interrupt,
        }
    }
}

#[async_trait]
impl DeviceChooser for TerminalChooser {
    async fn choose(&mut self, devices: &[DeviceRef]) -> Option<usize> {
        let devices = devices.to_vec();
        let palette = self.palette;

        // stdin reads cannot be cancelled, so the reader runs on a detached
        // thread and is abandoned on interrupt
        let (tx, rx) = oneshot::channel();
        std::thread::spawn(move || {
            let stdin = std::io::stdin();
            let mut input = stdin.lock();
            let mut output = std::io::stderr();
            let _ = tx.send(prompt_for_choice(&devices, &mut input, &mut output, palette));
        });

        select! {
            res = rx => res.ok().flatten(),
            _ = self.interrupt.cancelled() => {
                debug!("device selection interrupted");
                None
            }
        }
    }
}
