use k8s_openapi::api::core::v1::ContainerState;
use std::collections::HashMap;

/// Converts a Kubernetes CPU quantity (`250m`, `0.5`, `1500000n`, `800u`) to millicores.
/// Sub-millicore remainders are truncated.
pub fn parse_cpu_to_millicores(q: &str) -> Option<i64> {
    let q = q.trim();
    if q.is_empty() {
        return None;
    }
    if let Some(stripped) = q.strip_suffix('n') {
        if let Ok(nanos) = stripped.parse::<i128>() {
            return Some((nanos / 1_000_000) as i64);
        }
    } else if let Some(stripped) = q.strip_suffix('u') {
        if let Ok(micros) = stripped.parse::<i128>() {
            return Some((micros / 1_000) as i64);
        }
    } else if let Some(stripped) = q.strip_suffix('m') {
        if let Ok(mc) = stripped.parse::<i64>() {
            return Some(mc);
        }
    } else {
        // bare cores, e.g. metrics-server reporting "2" or "0.25"
        if let Ok(cores) = q.parse::<f64>() {
            return Some((cores * 1000.0).round() as i64);
        }
    }
    None
}

/// Total CPU of a pod from its per-container usage maps. Unparseable values are skipped
/// and the total saturates instead of overflowing.
pub fn sum_cpu_millicores<'a, I>(usages: I) -> i64
where
    I: IntoIterator<Item = &'a HashMap<String, String>>,
{
    usages
        .into_iter()
        .filter_map(|usage| usage.get("cpu"))
        .filter_map(|q| parse_cpu_to_millicores(q))
        .fold(0i64, i64::saturating_add)
}

/// One-line description of a container state, e.g.
/// `Waiting: CreateContainerError: <message>`.
pub fn describe_container_state(state: Option<&ContainerState>) -> Option<String> {
    let state = state?;
    if let Some(waiting) = state.waiting.as_ref() {
        return Some(join_parts(
            "Waiting",
            waiting.reason.as_deref(),
            waiting.message.as_deref(),
            None,
        ));
    }
    if let Some(term) = state.terminated.as_ref() {
        return Some(join_parts(
            "Terminated",
            term.reason.as_deref(),
            term.message.as_deref(),
            Some(term.exit_code),
        ));
    }
    if state.running.is_some() {
        return Some("Running".to_string());
    }
    None
}

/// Current state followed by the last state when the container has one.
pub fn render_state_text(state: Option<&ContainerState>, last_state: Option<&ContainerState>) -> String {
    let current = describe_container_state(state).unwrap_or_else(|| "Unknown".to_string());
    match describe_container_state(last_state) {
        Some(last) => format!("{}; Last State: {}", current, last),
        None => current,
    }
}

fn join_parts(kind: &str, reason: Option<&str>, message: Option<&str>, exit_code: Option<i32>) -> String {
    let mut text = kind.to_string();
    if let Some(reason) = reason.filter(|r| !r.is_empty()) {
        text.push_str(": ");
        text.push_str(reason);
    }
    if let Some(code) = exit_code {
        text.push_str(&format!(" (exit {})", code));
    }
    if let Some(message) = message.filter(|m| !m.is_empty()) {
        text.push_str(": ");
        text.push_str(message.trim());
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::{ContainerStateRunning, ContainerStateTerminated, ContainerStateWaiting};

    #[test]
    fn test_parse_cpu_to_millicores() {
        assert_eq!(parse_cpu_to_millicores("1000000000n"), Some(1000));
        assert_eq!(parse_cpu_to_millicores("150000000n"), Some(150));
        assert_eq!(parse_cpu_to_millicores("500000u"), Some(500));
        assert_eq!(parse_cpu_to_millicores("100m"), Some(100));
        assert_eq!(parse_cpu_to_millicores("  15m "), Some(15));
        assert_eq!(parse_cpu_to_millicores("1"), Some(1000));
        assert_eq!(parse_cpu_to_millicores("0.5"), Some(500));

        assert_eq!(parse_cpu_to_millicores(""), None);
        assert_eq!(parse_cpu_to_millicores("invalid"), None);
        assert_eq!(parse_cpu_to_millicores("100x"), None);
    }

    #[test]
    fn test_sum_cpu_millicores() {
        let exporter: HashMap<String, String> = [("cpu".to_string(), "120m".to_string())].into();
        let proxy: HashMap<String, String> = [
            ("cpu".to_string(), "30000000n".to_string()),
            ("memory".to_string(), "20Mi".to_string()),
        ]
        .into();
        let broken: HashMap<String, String> = [("cpu".to_string(), "lots".to_string())].into();
        assert_eq!(sum_cpu_millicores([&exporter, &proxy, &broken]), 150);
        assert_eq!(sum_cpu_millicores(Vec::<&HashMap<String, String>>::new()), 0);
    }

    #[test]
    fn test_sum_cpu_millicores_saturates() {
        let huge: HashMap<String, String> =
            [("cpu".to_string(), "9223372036854775807m".to_string())].into();
        assert_eq!(sum_cpu_millicores([&huge, &huge]), i64::MAX);
    }

    #[test]
    fn test_describe_waiting_state() {
        let state = ContainerState {
            waiting: Some(ContainerStateWaiting {
                reason: Some("CreateContainerError".to_string()),
                message: Some("container create failed: seccomp filter: errno 524\n".to_string()),
            }),
            ..Default::default()
        };
        assert_eq!(
            describe_container_state(Some(&state)).unwrap(),
            "Waiting: CreateContainerError: container create failed: seccomp filter: errno 524"
        );
    }

    #[test]
    fn test_render_state_text_with_last_state() {
        let running = ContainerState {
            running: Some(ContainerStateRunning::default()),
            ..Default::default()
        };
        let terminated = ContainerState {
            terminated: Some(ContainerStateTerminated {
                reason: Some("Error".to_string()),
                exit_code: 1,
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(
            render_state_text(Some(&running), Some(&terminated)),
            "Running; Last State: Terminated: Error (exit 1)"
        );
        assert_eq!(render_state_text(None, None), "Unknown");
        assert_eq!(render_state_text(Some(&ContainerState::default()), None), "Unknown");
    }
}
