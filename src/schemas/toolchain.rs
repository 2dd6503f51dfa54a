// Data model for toolchain products discovered on the host and for the
// persisted toolchain selection.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One record of the probe tool's JSON output.
///
/// The probe emits many more keys; only the three we use are modelled.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeRecord {
    pub instance_id: String,
    #[serde(default)]
    pub display_name: String,
    pub installation_path: PathBuf,
}

/// A toolchain installation usable as a build environment.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolchainProduct {
    /// Unique id of the installation, stable across runs.
    pub instance_id: String,
    /// Human readable product name, e.g. "Visual Studio Build Tools 2022".
    pub display_name: String,
    /// Root directory of the installation.
    pub installation_root: PathBuf,
    /// The developer environment script, when one was found under the root.
    pub init_script: Option<PathBuf>,
}

/// A fixed-path installation the probe tool does not report.
#[derive(Debug, Clone)]
pub struct FixedInstallation {
    pub instance_id: String,
    pub display_name: String,
    pub installation_root: PathBuf,
    /// Script path relative to `installation_root`.
    pub init_script: PathBuf,
}

/// Contents of `config.json`: the persisted user selection.
///
/// Unknown keys are carried through untouched so a hand-edited file is not
/// truncated when we write it back.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectionConfig {
    #[serde(rename = "vsInstanceId", default, skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
