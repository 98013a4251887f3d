use std::path::PathBuf;

use clap::Parser;

use crate::settings::Settings;
use crate::windowing::Preset;

#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(name = "slicewise", version, about = "Browse and de-identify DICOM series")]
pub struct LaunchArgs {
    /// Directory whose sub-folders each hold one series.
    pub root: Option<PathBuf>,

    /// Sub-folder of the root to open first.
    #[arg(long)]
    pub folder: Option<String>,

    /// Compact layout for small screens.
    #[arg(long)]
    pub mobile: bool,

    /// Window preset to start with (e.g. "soft-tissue").
    #[arg(long)]
    pub preset: Option<String>,

    /// Settings file to use instead of the per-user one.
    #[arg(long)]
    pub settings: Option<PathBuf>,
}

/// Start-up configuration after merging the command line over the settings file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    pub root: PathBuf,
    pub folder: Option<String>,
    pub mobile: bool,
    pub preset: Preset,
}

/// Merges the command line over the settings file. A bad preset name falls
/// back to the settings/default preset and is reported as a status message.
pub fn resolve_launch_request(
    args: &LaunchArgs,
    settings: &Settings,
) -> (LaunchRequest, Option<String>) {
    let fallback_preset = settings.preset().unwrap_or(Preset::Standard);
    let (preset, status) = match args.preset.as_deref().map(str::parse::<Preset>) {
        Some(Ok(preset)) => (preset, None),
        Some(Err(err)) => (fallback_preset, Some(format!("Launch args error: {err}"))),
        None => (fallback_preset, None),
    };

    let request = LaunchRequest {
        root: args
            .root
            .clone()
            .or_else(|| settings.root.clone())
            .unwrap_or_else(|| PathBuf::from(".")),
        folder: args.folder.clone().filter(|name| !name.trim().is_empty()),
        mobile: args.mobile || settings.mobile,
        preset,
    };
    (request, status)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> LaunchArgs {
        LaunchArgs::try_parse_from(std::iter::once("slicewise").chain(args.iter().copied()))
            .expect("arguments should parse")
    }

    #[test]
    fn defaults_to_current_directory() {
        let (request, status) = resolve_launch_request(&parse(&[]), &Settings::default());
        assert_eq!(status, None);
        assert_eq!(request.root, PathBuf::from("."));
        assert_eq!(request.folder, None);
        assert!(!request.mobile);
        assert_eq!(request.preset, Preset::Standard);
    }

    #[test]
    fn command_line_overrides_settings() {
        let settings = Settings {
            root: Some(PathBuf::from("/from/settings")),
            mobile: false,
            preset: Some("Perfusion".to_string()),
        };
        let args = parse(&[
            "/from/cli",
            "--folder",
            "CT-HEAD",
            "--mobile",
            "--preset",
            "soft-tissue",
        ]);
        let (request, _) = resolve_launch_request(&args, &settings);
        assert_eq!(request.root, PathBuf::from("/from/cli"));
        assert_eq!(request.folder.as_deref(), Some("CT-HEAD"));
        assert!(request.mobile);
        assert_eq!(request.preset, Preset::SoftTissue);
    }

    #[test]
    fn settings_fill_missing_arguments() {
        let settings = Settings {
            root: Some(PathBuf::from("/from/settings")),
            mobile: true,
            preset: Some("Contrast Enhanced".to_string()),
        };
        let (request, _) = resolve_launch_request(&parse(&[]), &settings);
        assert_eq!(request.root, PathBuf::from("/from/settings"));
        assert!(request.mobile);
        assert_eq!(request.preset, Preset::ContrastEnhanced);
    }

    #[test]
    fn unknown_preset_on_command_line_is_reported() {
        let settings = Settings {
            preset: Some("Perfusion".to_string()),
            ..Settings::default()
        };
        let (request, status) = resolve_launch_request(&parse(&["--preset", "bone"]), &settings);
        assert_eq!(request.preset, Preset::Perfusion);
        assert!(status.is_some_and(|message| message.contains("bone")));
    }

    #[test]
    fn rejects_unknown_flags() {
        assert!(LaunchArgs::try_parse_from(["slicewise", "--zoom"]).is_err());
    }
}
