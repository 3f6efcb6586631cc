use crate::analysis::{ranked_backward, ranked_forward, ArchiveUsage, TrackedGraph, VacuumReport};
use colored::Colorize;
use miette::Result;
use std::fmt::Write;

/// Terminal reporter with colored output
pub struct TerminalReporter {
    /// Vacuum report lists removable archives only
    removable_only: bool,
}

impl TerminalReporter {
    pub fn new() -> Self {
        Self { removable_only: false }
    }

    pub fn removable_only(mut self, removable_only: bool) -> Self {
        self.removable_only = removable_only;
        self
    }

    pub fn report_tracked(&self, tracked: &TrackedGraph) -> Result<()> {
        print!("{}", self.render_tracked(tracked));
        Ok(())
    }

    pub fn report_vacuum(&self, report: &VacuumReport) -> Result<()> {
        print!("{}", self.render_vacuum(report));
        Ok(())
    }

    /// One block per depth tier, nodes in ranking order
    pub fn render_tracked(&self, tracked: &TrackedGraph) -> String {
        let graph = &tracked.graph;
        let mut out = String::new();

        if graph.is_empty() {
            let _ = writeln!(out, "{}", "No classes to report.".yellow());
            return out;
        }

        for (depth, nodes) in tracked.tiers() {
            let _ = writeln!(out, "{}", format!("Depth: {}", depth).cyan().bold());
            for idx in nodes {
                let node = graph.node(idx);
                let name = if node.defined {
                    node.name.bold()
                } else {
                    node.name.red().bold()
                };
                let _ = writeln!(
                    out,
                    "  {} {}",
                    name,
                    format!(
                        "(transitive {}, direct {}, depth {})",
                        node.transitive_count,
                        graph.direct_count(idx),
                        node.depth
                    )
                    .dimmed()
                );
                for dependency in ranked_forward(graph, idx) {
                    let _ = writeln!(out, "    {} {}", "->".green(), dependency);
                }
                for dependent in ranked_backward(graph, idx) {
                    let _ = writeln!(out, "    {} {}", "<-".blue(), dependent);
                }
            }
            out.push('\n');
        }

        self.render_dangling(&mut out, tracked.dangling.iter().map(|d| (&d.from, &d.to)));
        let _ = writeln!(
            out,
            "{}",
            format!(
                "{} classes, {} roots, {} dependencies",
                graph.node_count(),
                tracked.roots.len(),
                graph.edge_count()
            )
            .bold()
        );
        out
    }

    pub fn render_vacuum(&self, report: &VacuumReport) -> String {
        let mut out = String::new();
        let archives: Vec<&ArchiveUsage> = if self.removable_only {
            report.removable().collect()
        } else {
            report.archives.iter().collect()
        };

        if archives.is_empty() {
            let _ = writeln!(out, "{}", "No removable archives.".green().bold());
        }

        for usage in archives {
            let verdict = if usage.removable {
                "REMOVABLE".red().bold()
            } else {
                "in use".green()
            };
            let _ = writeln!(out, "{} [{}] {}", usage.coordinate.to_string().cyan().bold(), usage.id, verdict);
            let _ = writeln!(
                out,
                "    used uniquely: {}  used duplicated: {}  unused: {}",
                usage.used_unique,
                usage.used_duplicated.to_string().yellow(),
                usage.unused
            );
            for class in &usage.duplicated_classes {
                let _ = writeln!(out, "    {} {}", "duplicate".yellow(), class);
            }
        }

        if !report.dangling.is_empty() {
            out.push('\n');
        }
        self.render_dangling(&mut out, report.dangling.iter().map(|d| (&d.from, &d.to)));
        out
    }

    fn render_dangling<'a>(&self, out: &mut String, dangling: impl ExactSizeIterator<Item = (&'a String, &'a String)>) {
        if dangling.len() == 0 {
            return;
        }
        let _ = writeln!(
            out,
            "{}",
            format!("{} references to undefined classes:", dangling.len()).yellow().bold()
        );
        for (from, to) in dangling {
            let _ = writeln!(out, "  {} {} {}", from, "->".dimmed(), to.red());
        }
        out.push('\n');
    }
}

impl Default for TerminalReporter {
    fn default() -> Self {
        Self::new()
    }
}
