use crate::parser::manifest::Action;
use crate::resolver::ResolvedWorkflow;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

/// One occurrence of an action in a job's dependency trees.
#[derive(Debug, Clone)]
pub struct ActionNode {
    pub label: String,
    pub depth: usize,
}

/// Resolved workflow as a directed graph, edges pointing from an action to
/// the actions it calls. Each job keeps its own cluster of nodes, so an
/// action used by two jobs appears twice.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    pub name: String,
    pub graph: DiGraph<ActionNode, ()>,
    pub clusters: Vec<(String, Vec<NodeIndex>)>,
}

impl DependencyGraph {
    pub fn from_workflow(resolved: &ResolvedWorkflow) -> Self {
        let mut graph = DiGraph::new();
        let mut clusters = Vec::with_capacity(resolved.jobs.len());

        for job in &resolved.jobs {
            let mut members = Vec::new();
            for action in job.steps.iter().filter_map(|s| s.action.as_ref()) {
                add_tree(&mut graph, &mut members, action, 0);
            }
            clusters.push((job.name.clone(), members));
        }

        Self {
            name: resolved.source_file.clone(),
            graph,
            clusters,
        }
    }

    /// Actions called directly by workflow steps.
    pub fn roots(&self) -> Vec<NodeIndex> {
        self.graph
            .node_indices()
            .filter(|&idx| self.graph[idx].depth == 0)
            .collect()
    }

    /// Actions that call nothing further.
    pub fn leaves(&self) -> Vec<NodeIndex> {
        self.graph
            .node_indices()
            .filter(|&idx| {
                self.graph
                    .neighbors_directed(idx, Direction::Outgoing)
                    .next()
                    .is_none()
            })
            .collect()
    }

    fn fill_color(&self, idx: NodeIndex, leaves: &[NodeIndex]) -> &'static str {
        if self.graph[idx].depth == 0 {
            "#22c55e"
        } else if leaves.contains(&idx) {
            "#3b82f6"
        } else {
            "#f59e0b"
        }
    }
}

fn add_tree(
    graph: &mut DiGraph<ActionNode, ()>,
    members: &mut Vec<NodeIndex>,
    action: &Action,
    depth: usize,
) -> NodeIndex {
    let idx = graph.add_node(ActionNode {
        label: action.label(),
        depth,
    });
    members.push(idx);
    for dependent in &action.dependents {
        let child = add_tree(graph, members, dependent, depth + 1);
        graph.add_edge(idx, child, ());
    }
    idx
}

fn node_id(idx: NodeIndex) -> String {
    format!("n{}", idx.index())
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Render a DOT (Graphviz) digraph with one `cluster_` subgraph per job.
pub fn to_dot(deps: &DependencyGraph) -> String {
    let mut lines = Vec::new();
    lines.push(format!("digraph \"{}\" {{", escape(&deps.name)));
    lines.push(format!("    label=\"{}\";", escape(&deps.name)));
    lines.push("    rankdir=LR;".to_string());
    lines.push("    node [shape=box, style=\"rounded,filled\", fontname=\"Helvetica\", fontcolor=\"#ffffff\"];".to_string());
    lines.push("    edge [color=\"#666666\"];".to_string());

    let leaves = deps.leaves();
    for (i, (job, members)) in deps.clusters.iter().enumerate() {
        lines.push(String::new());
        lines.push(format!("    subgraph cluster_{} {{", i));
        lines.push(format!("        label=\"{}\";", escape(job)));
        for &idx in members {
            lines.push(format!(
                "        {} [label=\"{}\", fillcolor=\"{}\"];",
                node_id(idx),
                escape(&deps.graph[idx].label),
                deps.fill_color(idx, &leaves)
            ));
        }
        lines.push("    }".to_string());
    }

    lines.push(String::new());
    for edge in deps.graph.raw_edges() {
        lines.push(format!(
            "    {} -> {};",
            node_id(edge.source()),
            node_id(edge.target())
        ));
    }

    lines.push("}".to_string());
    lines.join("\n")
}

/// Render a Mermaid flowchart with one subgraph per job.
pub fn to_mermaid(deps: &DependencyGraph) -> String {
    let mut lines = vec!["graph LR".to_string()];

    for (i, (job, members)) in deps.clusters.iter().enumerate() {
        lines.push(format!("    subgraph job{}[\"{}\"]", i, job.replace('"', "#quot;")));
        for &idx in members {
            lines.push(format!(
                "        {}[\"{}\"]",
                node_id(idx),
                deps.graph[idx].label.replace('"', "#quot;")
            ));
        }
        lines.push("    end".to_string());
    }

    for edge in deps.graph.raw_edges() {
        lines.push(format!(
            "    {} --> {}",
            node_id(edge.source()),
            node_id(edge.target())
        ));
    }

    let roots: Vec<String> = deps.roots().into_iter().map(node_id).collect();
    if !roots.is_empty() {
        lines.push(format!("    style {} fill:#22c55e,color:#fff", roots.join(",")));
    }
    let leaves: Vec<String> = deps
        .leaves()
        .into_iter()
        .filter(|&idx| deps.graph[idx].depth > 0)
        .map(node_id)
        .collect();
    if !leaves.is_empty() {
        lines.push(format!("    style {} fill:#3b82f6,color:#fff", leaves.join(",")));
    }

    lines.join("\n")
}
