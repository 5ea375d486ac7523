use crate::experience::Experience;
use crate::options::ExperienceOptions;

/// Owns the one live [`Experience`] of a process.
///
/// The first [`launch`](Self::launch) builds the experience; later calls hand
/// back the same instance and drop their options unused.
#[derive(Debug, Default)]
pub struct ExperienceHost {
    slot: Option<Experience>,
}

impl ExperienceHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn launch(&mut self, options: ExperienceOptions) -> &mut Experience {
        if self.slot.is_some() {
            tracing::debug!("experience already launched; ignoring new options");
        }
        self.slot.get_or_insert_with(|| Experience::new(options))
    }

    pub fn is_launched(&self) -> bool {
        self.slot.is_some()
    }

    pub fn get(&self) -> Option<&Experience> {
        self.slot.as_ref()
    }

    pub fn get_mut(&mut self) -> Option<&mut Experience> {
        self.slot.as_mut()
    }

    /// Stop and release the experience, allowing a fresh launch.
    pub fn shutdown(&mut self) -> Option<Experience> {
        let mut experience = self.slot.take()?;
        experience.destroy();
        Some(experience)
    }
}
