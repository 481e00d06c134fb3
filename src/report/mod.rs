//! Human-readable terminal summary of a scan.
//!
//! Renders totals, layer distribution, complexity hotspots, and the issue
//! list with severity coloring. JSON output is the machine interface; this
//! is the glanceable one.
//!
//! Color scheme follows the severity ladder: errors bright red, warnings
//! yellow, structural info bright blue, metadata dimmed. Every colored
//! path goes through the `paint` helper so `--no-color` produces plain
//! text with identical layout.

use std::fmt::Write;

use owo_colors::{OwoColorize, Style};

use crate::scan::ScanReport;
use crate::serialize::SerializedGraph;
use crate::types::{ArchLayer, Severity};

/// How many hotspot and issue lines the summary shows before eliding.
const MAX_LISTED: usize = 10;

fn paint(text: &str, style: Style, color: bool) -> String {
    if color {
        text.style(style).to_string()
    } else {
        text.to_string()
    }
}

fn header(text: &str, color: bool) -> String {
    paint(text, Style::new().bold(), color)
}

fn severity_tag(severity: Severity, color: bool) -> String {
    match severity {
        Severity::Error => paint("error", Style::new().bright_red().bold(), color),
        Severity::Warning => paint("warning", Style::new().yellow(), color),
    }
}

fn layer_label(layer: ArchLayer) -> &'static str {
    match layer {
        ArchLayer::Presentation => "presentation",
        ArchLayer::Business => "business",
        ArchLayer::Data => "data",
        ArchLayer::Infrastructure => "infrastructure",
        ArchLayer::Shared => "shared",
    }
}

/// Render the full scan summary.
pub fn render_summary(report: &ScanReport, color: bool) -> String {
    let mut out = String::new();
    let graph = &report.graph;
    let meta = &graph.metadata;

    let _ = writeln!(out, "{}", header("Dependency graph", color));
    let _ = writeln!(
        out,
        "  {} files, {} lines, {} dependencies, {} nodes, {} edges",
        meta.total_files,
        meta.total_lines,
        meta.total_dependencies,
        graph.nodes.len(),
        graph.edges.len()
    );

    render_layers(&mut out, graph, color);
    render_hotspots(&mut out, graph, color);
    render_issues(&mut out, graph, color);

    if graph.cycles_truncated {
        let _ = writeln!(
            out,
            "\n{}",
            paint(
                "note: cycle search hit its budget; the circular dependency list may be incomplete",
                Style::new().dimmed(),
                color
            )
        );
    }

    out
}

fn render_layers(out: &mut String, graph: &SerializedGraph, color: bool) {
    // Recount from nodes: layer distribution over scanned internal files.
    let mut counts: Vec<(ArchLayer, usize)> = Vec::new();
    for node in graph.nodes.iter().filter(|n| n.scanned && !n.is_external) {
        match counts.iter_mut().find(|(layer, _)| *layer == node.layer) {
            Some((_, count)) => *count += 1,
            None => counts.push((node.layer, 1)),
        }
    }
    if counts.is_empty() {
        return;
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| layer_label(a.0).cmp(layer_label(b.0))));

    let _ = writeln!(out, "\n{}", header("Layers", color));
    for (layer, count) in counts {
        let _ = writeln!(out, "  {:>4}  {}", count, layer_label(layer));
    }
}

fn render_hotspots(out: &mut String, graph: &SerializedGraph, color: bool) {
    let hotspots: Vec<_> = graph
        .nodes
        .iter()
        .filter(|n| matches!(n.complexity_bucket, crate::types::ComplexityBucket::Critical))
        .collect();
    if hotspots.is_empty() {
        return;
    }

    let _ = writeln!(out, "\n{}", header("Complexity hotspots", color));
    let mut sorted = hotspots;
    sorted.sort_by(|a, b| b.complexity.cmp(&a.complexity).then_with(|| a.id.cmp(&b.id)));
    for node in sorted.iter().take(MAX_LISTED) {
        let _ = writeln!(
            out,
            "  {:>4}  {}",
            node.complexity,
            paint(&node.id, Style::new().bright_blue(), color)
        );
    }
    if sorted.len() > MAX_LISTED {
        let _ = writeln!(
            out,
            "  {}",
            paint(&format!("... and {} more", sorted.len() - MAX_LISTED), Style::new().dimmed(), color)
        );
    }
}

fn render_issues(out: &mut String, graph: &SerializedGraph, color: bool) {
    let _ = writeln!(out, "\n{}", header("Issues", color));
    if graph.issues.is_empty() {
        let _ = writeln!(out, "  {}", paint("none found", Style::new().green(), color));
        return;
    }

    for issue in graph.issues.iter().take(MAX_LISTED) {
        let _ = writeln!(out, "  {}: {}", severity_tag(issue.severity, color), issue.message);
    }
    if graph.issues.len() > MAX_LISTED {
        let _ = writeln!(
            out,
            "  {}",
            paint(
                &format!("... and {} more", graph.issues.len() - MAX_LISTED),
                Style::new().dimmed(),
                color
            )
        );
    }
}

/// Render the --stats footer.
pub fn render_stats(report: &ScanReport, color: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", header("Scan stats", color));
    let _ = writeln!(out, "  files discovered: {}", report.stats.files_discovered);
    let _ = writeln!(out, "  files parsed:     {}", report.stats.files_parsed);
    let _ = writeln!(out, "  elapsed:          {:.1?}", report.stats.elapsed);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScanConfig;
    use crate::scan::{run_scan, CancelToken, ScanOutcome};
    use std::fs;

    fn scan_fixture() -> ScanReport {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.js"), "import { b } from './b';\n").unwrap();
        fs::write(dir.path().join("b.js"), "import { a } from './a';\n").unwrap();
        fs::write(dir.path().join("lonely.js"), "export const x = 1;\n").unwrap();
        match run_scan(dir.path(), &ScanConfig::default(), &CancelToken::new()).unwrap() {
            ScanOutcome::Completed(report) => *report,
            ScanOutcome::Cancelled => panic!("not cancelled"),
        }
    }

    #[test]
    fn test_summary_mentions_issues() {
        let report = scan_fixture();
        let summary = render_summary(&report, false);
        assert!(summary.contains("Circular dependency"));
        assert!(summary.contains("lonely.js"));
        assert!(summary.contains("error:"));
        assert!(summary.contains("warning:"));
    }

    #[test]
    fn test_no_color_output_is_plain() {
        let report = scan_fixture();
        let summary = render_summary(&report, false);
        assert!(!summary.contains('\x1b'), "no ANSI escapes without color");
    }

    #[test]
    fn test_clean_graph_reports_no_issues() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.js"), "import { b } from './b';\n").unwrap();
        fs::write(dir.path().join("b.js"), "export const b = 1;\n").unwrap();
        let report = match run_scan(dir.path(), &ScanConfig::default(), &CancelToken::new()).unwrap()
        {
            ScanOutcome::Completed(report) => *report,
            ScanOutcome::Cancelled => panic!("not cancelled"),
        };
        let summary = render_summary(&report, false);
        assert!(summary.contains("none found"));
    }

    #[test]
    fn test_stats_footer() {
        let report = scan_fixture();
        let stats = render_stats(&report, false);
        assert!(stats.contains("files discovered: 3"));
        assert!(stats.contains("files parsed:     3"));
    }
}
