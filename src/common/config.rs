use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use anyhow::bail;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use tracing::error;

use crate::common::collections::HashSet;
use crate::layout_engine::slice::ParentArea;
use crate::layout_engine::{
    CardinalDirection, ColumnLayoutEngine, CreateLeafLayoutEngine, CreateProxyLayoutEngine,
    FloatingLayoutEngine, GapsLayoutEngine, LayoutContextRef, LayoutEngineIdentity, LayoutEngineRef,
    ProxyFloatingLayoutEngine, SliceLayoutEngine, TreeLayoutEngine, WindowInsertionType,
};
use crate::store::RouterOptions;

const MAX_WORKSPACES: usize = 32;

pub const DEFAULT_CONFIG: &str = include_str!("../../tessera.default.toml");

fn home_dir() -> PathBuf { dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")) }

pub fn data_dir() -> PathBuf { home_dir().join(".tessera") }
pub fn saved_state_file() -> PathBuf { data_dir().join("saved_state.ron") }
pub fn config_file() -> PathBuf { home_dir().join(".tessera.toml") }

/// The layouts every workspace can be built from, by their configuration name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum LayoutKind {
    Tree,
    Column,
    RightToLeft,
    Row,
    PrimaryStack,
    MultiColumn,
    SecondaryPrimary,
    Floating,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub tree: TreeSettings,
    #[serde(default)]
    pub slice: SliceSettings,
    #[serde(default)]
    pub floating: FloatingSettings,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Layout names, either a [`LayoutKind`] or a custom slice layout. Every
    /// workspace gets one engine per entry; the first is active.
    #[serde(default = "default_layouts")]
    pub layouts: Vec<String>,
    #[serde(default)]
    pub router: RouterOptions,
    #[serde(default = "default_workspace_names")]
    pub workspace_names: Vec<String>,
    #[serde(default)]
    pub gaps: GapSettings,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct GapSettings {
    #[serde(default)]
    pub outer: OuterGaps,
    #[serde(default)]
    pub inner: InnerGaps,
}

/// Space between the screen edges and the windows, in unscaled pixels.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct OuterGaps {
    #[serde(default)]
    pub top: i32,
    #[serde(default)]
    pub left: i32,
    #[serde(default)]
    pub bottom: i32,
    #[serde(default)]
    pub right: i32,
}

/// Space between neighbouring windows, in unscaled pixels.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct InnerGaps {
    #[serde(default)]
    pub horizontal: i32,
    #[serde(default)]
    pub vertical: i32,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct TreeSettings {
    #[serde(default)]
    pub add_direction: CardinalDirection,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct SliceSettings {
    #[serde(default)]
    pub insertion_type: WindowInsertionType,
    /// Capacities of the multi-column layout; 0 marks the overflow column.
    #[serde(default = "default_multi_column_capacities")]
    pub multi_column_capacities: Vec<usize>,
    #[serde(default = "default_primary_capacity")]
    pub primary_capacity: usize,
    #[serde(default = "default_secondary_capacity")]
    pub secondary_capacity: usize,
    #[serde(default)]
    pub custom: Vec<CustomSliceLayout>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct CustomSliceLayout {
    pub name: String,
    pub root: ParentArea,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct FloatingSettings {
    /// Wraps every engine so windows can be floated on top of it.
    #[serde(default = "yes")]
    pub proxy: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            layouts: default_layouts(),
            router: RouterOptions::default(),
            workspace_names: default_workspace_names(),
            gaps: GapSettings::default(),
        }
    }
}

impl Default for SliceSettings {
    fn default() -> Self {
        Self {
            insertion_type: WindowInsertionType::default(),
            multi_column_capacities: default_multi_column_capacities(),
            primary_capacity: default_primary_capacity(),
            secondary_capacity: default_secondary_capacity(),
            custom: Vec::new(),
        }
    }
}

impl Default for FloatingSettings {
    fn default() -> Self { Self { proxy: true } }
}

impl Settings {
    pub fn validate(&self, slice: &SliceSettings) -> Vec<String> {
        let mut issues = Vec::new();

        if self.layouts.is_empty() {
            issues.push("layouts must name at least one layout".to_string());
        }
        for name in &self.layouts {
            if LayoutKind::from_str(name).is_err() && slice.custom_layout(name).is_none() {
                issues.push(format!("Unknown layout '{name}'"));
            }
        }

        if self.workspace_names.len() > MAX_WORKSPACES {
            issues.push(format!(
                "workspace_names should not name more than {MAX_WORKSPACES} workspaces"
            ));
        }
        let mut seen = HashSet::default();
        for name in &self.workspace_names {
            if name.trim().is_empty() {
                issues.push("Workspace names must not be empty".to_string());
            } else if !seen.insert(name) {
                issues.push(format!("Duplicate workspace name '{name}'"));
            }
        }

        issues.extend(self.gaps.validate());

        issues
    }

    pub fn auto_fix_values(&mut self, slice: &SliceSettings) -> usize {
        let mut fixes = 0;

        let before = self.layouts.len();
        self.layouts
            .retain(|name| LayoutKind::from_str(name).is_ok() || slice.custom_layout(name).is_some());
        fixes += before - self.layouts.len();
        if self.layouts.is_empty() {
            self.layouts = default_layouts();
            fixes += 1;
        }

        let mut seen = HashSet::default();
        let before = self.workspace_names.len();
        self.workspace_names
            .retain(|name| !name.trim().is_empty() && seen.insert(name.clone()));
        self.workspace_names.truncate(MAX_WORKSPACES);
        fixes += before - self.workspace_names.len();

        fixes += self.gaps.auto_fix_values();

        fixes
    }
}

impl GapSettings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = self.outer.validate();
        issues.extend(self.inner.validate());
        issues
    }

    pub fn auto_fix_values(&mut self) -> usize {
        self.outer.auto_fix_values() + self.inner.auto_fix_values()
    }

    pub fn is_empty(&self) -> bool { *self == GapSettings::default() }
}

fn negative_gap(field: &str, value: i32) -> Option<String> {
    (value < 0).then(|| format!("{field} gap must be non-negative, got {value}"))
}

fn clamp_gap(value: &mut i32) -> usize {
    if *value < 0 {
        *value = 0;
        1
    } else {
        0
    }
}

impl OuterGaps {
    pub fn validate(&self) -> Vec<String> {
        [
            negative_gap("outer.top", self.top),
            negative_gap("outer.left", self.left),
            negative_gap("outer.bottom", self.bottom),
            negative_gap("outer.right", self.right),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    pub fn auto_fix_values(&mut self) -> usize {
        clamp_gap(&mut self.top)
            + clamp_gap(&mut self.left)
            + clamp_gap(&mut self.bottom)
            + clamp_gap(&mut self.right)
    }
}

impl InnerGaps {
    pub fn validate(&self) -> Vec<String> {
        [
            negative_gap("inner.horizontal", self.horizontal),
            negative_gap("inner.vertical", self.vertical),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    pub fn auto_fix_values(&mut self) -> usize {
        clamp_gap(&mut self.horizontal) + clamp_gap(&mut self.vertical)
    }
}

impl TreeSettings {
    // Every CardinalDirection is a valid add direction.
    pub fn validate(&self) -> Vec<String> { Vec::new() }

    pub fn auto_fix_values(&mut self) -> usize { 0 }
}

impl SliceSettings {
    pub fn custom_layout(&self, name: &str) -> Option<&CustomSliceLayout> {
        self.custom.iter().find(|layout| layout.name == name)
    }

    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.multi_column_capacities.is_empty() {
            issues.push("multi_column_capacities must have at least one column".to_string());
        }
        if self.primary_capacity == 0 {
            issues.push("primary_capacity must be at least 1".to_string());
        }
        if self.secondary_capacity == 0 {
            issues.push("secondary_capacity must be at least 1".to_string());
        }

        let mut seen = HashSet::default();
        for layout in &self.custom {
            if LayoutKind::from_str(&layout.name).is_ok() {
                issues.push(format!("Custom layout '{}' shadows a built-in layout", layout.name));
            }
            if !seen.insert(&layout.name) {
                issues.push(format!("Duplicate custom layout '{}'", layout.name));
            }
            if layout.root.children.is_empty() {
                issues.push(format!("Custom layout '{}' has no areas", layout.name));
            }
        }

        issues
    }

    pub fn auto_fix_values(&mut self) -> usize {
        let mut fixes = 0;

        if self.multi_column_capacities.is_empty() {
            self.multi_column_capacities = default_multi_column_capacities();
            fixes += 1;
        }
        if self.primary_capacity == 0 {
            self.primary_capacity = default_primary_capacity();
            fixes += 1;
        }
        if self.secondary_capacity == 0 {
            self.secondary_capacity = default_secondary_capacity();
            fixes += 1;
        }

        let mut seen = HashSet::default();
        let before = self.custom.len();
        self.custom.retain(|layout| {
            LayoutKind::from_str(&layout.name).is_err()
                && !layout.root.children.is_empty()
                && seen.insert(layout.name.clone())
        });
        fixes += before - self.custom.len();

        fixes
    }
}

impl FloatingSettings {
    pub fn validate(&self) -> Vec<String> { Vec::new() }

    pub fn auto_fix_values(&mut self) -> usize { 0 }
}

fn yes() -> bool { true }

fn default_layouts() -> Vec<String> {
    [LayoutKind::Tree, LayoutKind::PrimaryStack, LayoutKind::Floating]
        .iter()
        .map(ToString::to_string)
        .collect()
}

fn default_workspace_names() -> Vec<String> {
    (1..=4).map(|i| i.to_string()).collect()
}

fn default_multi_column_capacities() -> Vec<usize> { vec![1, 2, 0] }

fn default_primary_capacity() -> usize { 1 }

fn default_secondary_capacity() -> usize { 2 }

impl Config {
    pub fn read(path: &Path) -> anyhow::Result<Config> {
        let buf = std::fs::read_to_string(path)?;
        Self::parse(&buf)
    }

    /// The configuration shipped with the crate.
    pub fn bundled() -> Config {
        match Self::parse(DEFAULT_CONFIG) {
            Ok(config) => config,
            Err(err) => {
                error!(%err, "Bundled configuration is invalid, using built-in defaults");
                Config::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let toml_string = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, toml_string.as_bytes())?;

        Ok(())
    }

    pub fn parse(buf: &str) -> anyhow::Result<Config> {
        let config: Config = toml::from_str(buf)?;
        Ok(config)
    }

    /// Validates the entire configuration and returns a list of issues found.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = self.settings.validate(&self.slice);
        issues.extend(self.tree.validate());
        issues.extend(self.slice.validate());
        issues.extend(self.floating.validate());
        issues
    }

    /// Attempts to fix configuration values automatically.
    /// Returns the number of fixes applied.
    pub fn auto_fix_values(&mut self) -> usize {
        let mut fixes = self.slice.auto_fix_values();
        fixes += self.settings.auto_fix_values(&self.slice);
        fixes += self.tree.auto_fix_values();
        fixes += self.floating.auto_fix_values();
        fixes
    }

    /// One factory per entry of `settings.layouts`, in order.
    pub fn layout_engine_creators(
        &self,
        ctx: LayoutContextRef,
    ) -> anyhow::Result<Vec<CreateLeafLayoutEngine>> {
        if self.settings.layouts.is_empty() {
            bail!("No layouts configured");
        }
        self.settings.layouts.iter().map(|name| self.layout_engine_creator(name, ctx.clone())).collect()
    }

    fn layout_engine_creator(
        &self,
        name: &str,
        ctx: LayoutContextRef,
    ) -> anyhow::Result<CreateLeafLayoutEngine> {
        if let Some(layout) = self.slice.custom_layout(name) {
            let root = layout.root.clone();
            let name = layout.name.clone();
            let insertion_type = self.slice.insertion_type;
            return Ok(Arc::new(move |identity: LayoutEngineIdentity| -> LayoutEngineRef {
                Arc::new(SliceLayoutEngine::new(identity, root.clone(), insertion_type).with_name(name.clone()))
            }));
        }

        let Ok(kind) = LayoutKind::from_str(name) else {
            bail!("Unknown layout '{name}', expected one of: {}", known_layouts());
        };
        let insertion_type = self.slice.insertion_type;
        let creator: CreateLeafLayoutEngine = match kind {
            LayoutKind::Tree => {
                let direction = self.tree.add_direction;
                Arc::new(move |identity: LayoutEngineIdentity| -> LayoutEngineRef {
                    Arc::new(TreeLayoutEngine::cardinal(ctx.clone(), identity, direction))
                })
            }
            LayoutKind::Column => Arc::new(|identity: LayoutEngineIdentity| -> LayoutEngineRef {
                Arc::new(ColumnLayoutEngine::new(identity, true))
            }),
            LayoutKind::RightToLeft => Arc::new(|identity: LayoutEngineIdentity| -> LayoutEngineRef {
                Arc::new(ColumnLayoutEngine::new(identity, false))
            }),
            LayoutKind::Row => Arc::new(move |identity: LayoutEngineIdentity| -> LayoutEngineRef {
                Arc::new(SliceLayoutEngine::row(identity, insertion_type))
            }),
            LayoutKind::PrimaryStack => Arc::new(move |identity: LayoutEngineIdentity| -> LayoutEngineRef {
                Arc::new(SliceLayoutEngine::primary_stack(identity, insertion_type))
            }),
            LayoutKind::MultiColumn => {
                let capacities = self.slice.multi_column_capacities.clone();
                Arc::new(move |identity: LayoutEngineIdentity| -> LayoutEngineRef {
                    Arc::new(SliceLayoutEngine::multi_column(identity, insertion_type, &capacities))
                })
            }
            LayoutKind::SecondaryPrimary => {
                let (primary, secondary) = (self.slice.primary_capacity, self.slice.secondary_capacity);
                Arc::new(move |identity: LayoutEngineIdentity| -> LayoutEngineRef {
                    Arc::new(SliceLayoutEngine::secondary_primary(
                        identity,
                        insertion_type,
                        primary,
                        secondary,
                    ))
                })
            }
            LayoutKind::Floating => Arc::new(move |identity: LayoutEngineIdentity| -> LayoutEngineRef {
                Arc::new(FloatingLayoutEngine::new(ctx.clone(), identity))
            }),
        };
        Ok(creator)
    }

    /// Wrappers applied to every engine, innermost first: gaps, then the
    /// floating proxy.
    pub fn proxy_layout_engine_creators(&self, ctx: LayoutContextRef) -> Vec<CreateProxyLayoutEngine> {
        let mut creators: Vec<CreateProxyLayoutEngine> = Vec::new();
        if !self.settings.gaps.is_empty() {
            let gaps = self.settings.gaps.clone();
            creators.push(Arc::new(move |inner: LayoutEngineRef| -> LayoutEngineRef {
                Arc::new(GapsLayoutEngine::new(gaps.clone(), inner))
            }));
        }
        if self.floating.proxy {
            creators.push(Arc::new(move |inner: LayoutEngineRef| -> LayoutEngineRef {
                Arc::new(ProxyFloatingLayoutEngine::new(ctx.clone(), inner))
            }));
        }
        creators
    }
}

fn known_layouts() -> String {
    LayoutKind::iter().map(|kind| kind.to_string()).collect::<Vec<_>>().join(", ")
}
