use serde::Serialize;

use super::DanglingReference;
use crate::discovery::ArchiveCoordinate;
use crate::project::ProjectModel;

/// How one archive's classes are used
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveUsage {
    pub id: String,
    pub coordinate: ArchiveCoordinate,

    /// Reached, and defined by this archive only
    pub used_unique: usize,

    /// Reached, and also defined by another archive
    pub used_duplicated: usize,

    /// Not reached from any root
    pub unused: usize,

    /// Names of the reached classes that another archive also defines
    pub duplicated_classes: Vec<String>,

    /// No reached classes at all
    pub removable: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct VacuumReport {
    pub archives: Vec<ArchiveUsage>,
    pub dangling: Vec<DanglingReference>,
}

impl VacuumReport {
    pub fn removable(&self) -> impl Iterator<Item = &ArchiveUsage> {
        self.archives.iter().filter(|usage| usage.removable)
    }
}

/// Classifies every archive's classes as unused, used uniquely or used
/// while duplicated elsewhere
pub struct VacuumAnalyzer;

impl VacuumAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// `model` must already be analysed
    pub fn classify(&self, model: &ProjectModel) -> VacuumReport {
        let graph = model.graph();
        let archives = model
            .archives()
            .iter()
            .map(|archive| {
                let mut usage = ArchiveUsage {
                    id: archive.id.clone(),
                    coordinate: archive.coordinate.clone(),
                    used_unique: 0,
                    used_duplicated: 0,
                    unused: 0,
                    duplicated_classes: Vec::new(),
                    removable: false,
                };
                for name in &archive.classes {
                    let Some(node) = graph.get(name) else {
                        continue;
                    };
                    if !node.depth.is_reached() {
                        usage.unused += 1;
                    } else if node.is_duplicated() {
                        usage.used_duplicated += 1;
                        usage.duplicated_classes.push(name.clone());
                    } else {
                        usage.used_unique += 1;
                    }
                }
                usage.duplicated_classes.sort();
                usage.removable = usage.used_unique + usage.used_duplicated == 0;
                usage
            })
            .collect();

        VacuumReport {
            archives,
            dangling: model.dangling().to_vec(),
        }
    }
}

impl Default for VacuumAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
