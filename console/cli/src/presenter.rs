use barq_controller::{ConsoleEvent, EventSink};
use barq_shared::{ConsoleError, ExecutionType, InvocationResult};
use tracing::debug;

/// Renders console events on stdout/stderr.
pub struct TerminalPresenter;

impl EventSink for TerminalPresenter {
    fn publish(&self, event: ConsoleEvent) {
        match event {
            ConsoleEvent::Loading { id, operation } => debug!("{} {} started", operation, id),
            ConsoleEvent::Idle { id, operation } => debug!("{} {} finished", operation, id),
            ConsoleEvent::CatalogReady { runtimes, selected } => {
                debug!("{} runtimes available, selected {:?}", runtimes, selected)
            }
            ConsoleEvent::CatalogWarning { message } => {
                eprintln!("warning: could not load runtimes: {}", message)
            }
            ConsoleEvent::Deployed { func_id, .. } => println!("Deployed {}", func_id),
            ConsoleEvent::Invoked { result, .. } => print!("{}", render_invocation(&result)),
            ConsoleEvent::Failed { error, .. } => report(&error),
        }
    }
}

pub fn report(error: &ConsoleError) {
    eprintln!("error: {}", error);
}

fn badge(execution_type: ExecutionType) -> &'static str {
    match execution_type {
        ExecutionType::Cold => "[COLD]",
        ExecutionType::Warm => "[WARM]",
    }
}

pub fn render_invocation(result: &InvocationResult) -> String {
    let mut rendered = String::new();
    if let Some(performance) = &result.performance {
        rendered.push_str(badge(performance.execution_type));
        rendered.push('\n');
        // the execution type is already shown as the badge
        for (label, value) in performance.fields().into_iter().skip(1) {
            rendered.push_str(&format!("  {:<15} {}\n", label, value));
        }
    }
    rendered.push_str(&result.output);
    if !result.output.ends_with('\n') {
        rendered.push('\n');
    }
    rendered
}
