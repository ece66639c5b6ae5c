// SPDX-License-Identifier: MIT OR Apache-2.0
//! Built-in arithmetic graph and outcome logging.

use dataflow_graph::kinds::{Add, Constant};
use dataflow_graph::{
    ConnectError, EvaluationReport, GraphSession, Handle, NodeId, PinId, TopologicalOrder, Value,
};

/// Handles of the demo nodes
#[derive(Debug, Clone, Copy)]
pub struct ArithmeticDemo {
    /// Constant node
    pub constant: Handle,
    /// Add node
    pub add: Handle,
}

/// Build `constant(5) -> add.lhs`, with `add.rhs` preset to 3
pub fn build_arithmetic(session: &mut GraphSession) -> Result<ArithmeticDemo, ConnectError> {
    let constant = Constant::node("Constant", Value::Int(5));
    let constant_id = constant.id();

    let mut add = Add::node("Add");
    if let Some(rhs) = add.input_mut(Add::RHS) {
        rhs.set_default(Value::Int(3));
    }
    let add_id = add.id();

    let demo = ArithmeticDemo {
        constant: session.add_node(constant),
        add: session.add_node(add),
    };
    session.connect(
        PinId::source(constant_id, Constant::VALUE),
        PinId::sink(add_id, Add::LHS),
    )?;
    Ok(demo)
}

fn label(session: &GraphSession, node_id: NodeId) -> String {
    session
        .nodes()
        .get(node_id)
        .map_or_else(|| node_id.to_string(), |node| node.label().to_string())
}

/// Log a topological order by node label
pub fn log_order(session: &GraphSession, order: &TopologicalOrder) {
    let ordered: Vec<_> = order.ordered().iter().map(|id| label(session, *id)).collect();
    tracing::info!("Evaluation order: {}", ordered.join(" -> "));

    if !order.is_complete() {
        let cyclic: Vec<_> = order.unordered().iter().map(|id| label(session, *id)).collect();
        tracing::warn!("Unordered (cyclic): {}", cyclic.join(", "));
    }
}

/// Log every published output and every failure of an evaluation pass
pub fn log_report(session: &GraphSession, report: &EvaluationReport) {
    for node_id in &report.evaluated {
        let Some(node) = session.nodes().get(*node_id) else {
            continue;
        };
        for pin in node.output_pins() {
            if let Some(value) = report.output(*node_id, pin.id().slot) {
                tracing::info!("{}.{} = {value}", node.label(), pin.name());
            }
        }
    }
    for (node_id, error) in &report.failures {
        tracing::warn!("{}: {error}", label(session, *node_id));
    }
}
