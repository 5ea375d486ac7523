use horizon_common::Param;

/// Environment variable that switches the debug panel on.
pub const DEBUG_ENV: &str = "HORIZON_DEBUG";

/// A bound control inside a debug folder.
#[derive(Debug, Clone)]
pub enum Control {
    Toggle(Param<bool>),
    Slider {
        value: Param<f32>,
        min: f32,
        max: f32,
        step: f32,
    },
}

#[derive(Debug, Clone)]
pub struct Binding {
    pub label: String,
    pub control: Control,
}

/// Named group of bindings.
#[derive(Debug, Clone)]
pub struct DebugFolder {
    name: String,
    bindings: Vec<Binding>,
}

impl DebugFolder {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            bindings: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn find(&self, label: &str) -> Option<&Binding> {
        self.bindings.iter().find(|b| b.label == label)
    }

    /// Bind a boolean parameter as a checkbox.
    pub fn add_toggle(&mut self, label: impl Into<String>, value: &Param<bool>) -> &mut Self {
        self.bindings.push(Binding {
            label: label.into(),
            control: Control::Toggle(value.clone()),
        });
        self
    }

    /// Bind a float parameter as a slider over `[min, max]`.
    pub fn add_slider(
        &mut self,
        label: impl Into<String>,
        value: &Param<f32>,
        min: f32,
        max: f32,
        step: f32,
    ) -> &mut Self {
        self.bindings.push(Binding {
            label: label.into(),
            control: Control::Slider {
                value: value.clone(),
                min,
                max,
                step,
            },
        });
        self
    }
}

/// Debug facility: a set of folders of live-tweakable parameters.
///
/// An inactive panel hands out no folders, so callers register bindings only
/// when debugging is on.
#[derive(Debug, Clone, Default)]
pub struct DebugPanel {
    active: bool,
    folders: Vec<DebugFolder>,
}

impl DebugPanel {
    pub fn new(active: bool) -> Self {
        if active {
            tracing::info!("debug panel active");
        }
        Self {
            active,
            folders: Vec::new(),
        }
    }

    /// Active when [`DEBUG_ENV`] is set to anything but `0`/`false`.
    pub fn from_env() -> Self {
        let active = std::env::var(DEBUG_ENV)
            .map(|v| parse_flag(&v))
            .unwrap_or(false);
        Self::new(active)
    }

    pub fn active(&self) -> bool {
        self.active
    }

    /// Get or create the folder `name`. `None` when the panel is inactive.
    pub fn folder(&mut self, name: &str) -> Option<&mut DebugFolder> {
        if !self.active {
            return None;
        }
        let index = match self.folders.iter().position(|f| f.name == name) {
            Some(i) => i,
            None => {
                self.folders.push(DebugFolder::new(name));
                self.folders.len() - 1
            }
        };
        Some(&mut self.folders[index])
    }

    pub fn folders(&self) -> &[DebugFolder] {
        &self.folders
    }

    pub fn get_folder(&self, name: &str) -> Option<&DebugFolder> {
        self.folders.iter().find(|f| f.name == name)
    }
}

fn parse_flag(value: &str) -> bool {
    !matches!(value.trim().to_ascii_lowercase().as_str(), "" | "0" | "false" | "off")
}
