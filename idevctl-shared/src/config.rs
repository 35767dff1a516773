use serde::{Deserialize, Serialize};

/// Command templates for the external USB tooling.
///
/// Each template is a program followed by its arguments. `{udid}` and
/// `{file}` are substituted per invocation.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ToolConfig {
    pub list_devices: Vec<String>,
    #[serde(default)]
    pub device_name: Option<Vec<String>>,
    pub probe: Vec<String>,
    pub syslog: Vec<String>,
    #[serde(default)]
    pub syslog_no_color_args: Vec<String>,
    pub profile_install: Vec<String>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        ToolConfig {
            list_devices: args(&["idevice_id", "-l"]),
            device_name: Some(args(&["idevicename", "-u", "{udid}"])),
            probe: args(&["ideviceinfo", "-u", "{udid}", "-k", "UniqueDeviceID"]),
            syslog: args(&["idevicesyslog", "-u", "{udid}"]),
            syslog_no_color_args: args(&["--no-colors"]),
            profile_install: args(&[
                "pymobiledevice3",
                "profile",
                "install",
                "--udid",
                "{udid}",
                "{file}",
            ]),
        }
    }
}

fn args(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

/// Substitute `{name}` placeholders in every element of a template.
pub fn render_template(template: &[String], vars: &[(&str, &str)]) -> Vec<String> {
    template
        .iter()
        .map(|part| {
            vars.iter().fold(part.clone(), |acc, (name, value)| {
                acc.replace(&format!("{{{name}}}"), value)
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_substitutes_all_placeholders() {
        let tools = ToolConfig::default();
        let rendered = render_template(
            &tools.profile_install,
            &[("udid", "ABCD-1234"), ("file", "/tmp/wifi.mobileconfig")],
        );
        assert_eq!(
            rendered,
            vec![
                "pymobiledevice3",
                "profile",
                "install",
                "--udid",
                "ABCD-1234",
                "/tmp/wifi.mobileconfig"
            ]
        );
    }

    #[test]
    fn test_render_leaves_unknown_placeholders() {
        let rendered = render_template(&args(&["tool", "{other}"]), &[("udid", "X")]);
        assert_eq!(rendered, vec!["tool", "{other}"]);
    }

    #[test]
    fn test_missing_optional_fields_use_defaults() {
        let json = r#"{
            "list_devices": ["idevice_id", "-l"],
            "probe": ["true"],
            "syslog": ["cat"],
            "profile_install": ["true"]
        }"#;
        let tools: ToolConfig = serde_json::from_str(json).unwrap();
        assert_eq!(tools.device_name, None);
        assert!(tools.syslog_no_color_args.is_empty());
    }
}
