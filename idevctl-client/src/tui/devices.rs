use idevctl_shared::device::DeviceRef;

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const CYAN: &str = "\x1b[36m";

/// Applies ANSI styling only when the output is meant to be colored.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    ansi: bool,
}

impl Palette {
    pub fn new(ansi: bool) -> Self {
        Self { ansi }
    }

    fn paint(&self, code: &str, s: &str) -> String {
        if self.ansi {
            format!("{code}{s}{RESET}")
        } else {
            s.to_string()
        }
    }

    fn bold(&self, s: &str) -> String {
        self.paint(BOLD, s)
    }

    fn dim(&self, s: &str) -> String {
        self.paint(DIM, s)
    }

    fn cyan(&self, s: &str) -> String {
        self.paint(CYAN, s)
    }
}

fn visible_len(s: &str) -> usize {
    // strip ANSI CSI sequences: \x1b[ ... m
    let mut n = 0usize;
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            for x in chars.by_ref() {
                if x == 'm' {
                    break;
                }
            }
            continue;
        }
        n += 1;
    }
    n
}

fn pad_cell(s: &str, width: usize) -> String {
    let vis = visible_len(s);
    if vis >= width {
        s.to_string()
    } else {
        format!("{s}{}", " ".repeat(width - vis))
    }
}

/// Truncate a string to max length, adding "..." if truncated
fn truncate_str(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        format!("{}...", s.chars().take(max.saturating_sub(3)).collect::<String>())
    } else {
        s.to_string()
    }
}

const WIDTH_INDEX: usize = 4;
const WIDTH_UDID: usize = 42;
const WIDTH_LABEL: usize = 40;

/// Render attached devices as a numbered table.
pub fn render_devices_table(devices: &[DeviceRef], palette: Palette) -> String {
    if devices.is_empty() {
        return format!("{}\n", palette.dim("No devices found"));
    }

    let mut out = String::new();
    out.push_str(&palette.bold("Devices"));
    out.push('\n');
    out.push_str(&format!(
        "  {} {} {}\n",
        pad_cell(&palette.dim("#"), WIDTH_INDEX),
        pad_cell(&palette.dim("UDID"), WIDTH_UDID),
        palette.dim("LABEL"),
    ));

    for (i, dev) in devices.iter().enumerate() {
        let label = dev
            .label
            .as_deref()
            .map(|l| truncate_str(l, WIDTH_LABEL))
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "  {} {} {}\n",
            pad_cell(&palette.cyan(&(i + 1).to_string()), WIDTH_INDEX),
            pad_cell(&dev.udid, WIDTH_UDID),
            label,
        ));
    }

    out
}

pub fn render_choice_prompt(count: usize, palette: Palette) -> String {
    format!(
        "{} [1-{count}], {} to cancel: ",
        palette.bold("Select a device"),
        palette.dim("q")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn devices() -> Vec<DeviceRef> {
        vec![
            DeviceRef::new("00008030-001A2D3E0C41802E").with_label("iPhone, USB"),
            DeviceRef::new("abcdef0123456789abcdef0123456789abcdef01"),
        ]
    }

    #[test]
    fn test_table_without_ansi_has_no_escapes() {
        let table = render_devices_table(&devices(), Palette::new(false));
        assert!(!table.contains('\x1b'));
        assert!(table.contains("00008030-001A2D3E0C41802E"));
        assert!(table.contains("iPhone, USB"));
        assert!(table.contains("  2    abcdef0123456789abcdef0123456789abcdef01"));
    }

    #[test]
    fn test_table_columns_align_with_ansi() {
        let plain = render_devices_table(&devices(), Palette::new(false));
        let colored = render_devices_table(&devices(), Palette::new(true));
        let widths = |s: &str| s.lines().map(visible_len).collect::<Vec<_>>();
        assert_eq!(widths(&plain), widths(&colored));
    }

    #[test]
    fn test_empty_table() {
        assert_eq!(
            render_devices_table(&[], Palette::new(false)),
            "No devices found\n"
        );
    }

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("short", 10), "short");
        assert_eq!(truncate_str("a very long device name", 10), "a very ...");
    }

    #[test]
    fn test_prompt_mentions_range() {
        let prompt = render_choice_prompt(3, Palette::new(false));
        assert_eq!(prompt, "Select a device [1-3], q to cancel: ");
    }
}
