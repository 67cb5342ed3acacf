use dogclient::{Event, EventAlertType, EventPriority, MetricKind, MetricPoint, ServiceCheck};

/// Serializes a metric point as a dogstatsd line:
/// `name:value|TYPE[|@rate][|#tag1,tag2]`.
///
/// The host label has no field of its own in the metric syntax, so it is
/// appended as a trailing `host:` tag.
pub(crate) fn metric_line(point: &MetricPoint<'_>) -> String {
    let mut line = String::with_capacity(64);
    line.push_str(point.name);
    line.push(':');
    match point.kind {
        // Counts are integral; itoa keeps them free of a fractional part.
        MetricKind::Count => {
            let mut buf = itoa::Buffer::new();
            line.push_str(buf.format(point.value as i64));
        }
        MetricKind::Gauge | MetricKind::Histogram => push_f64(&mut line, point.value),
    }
    line.push('|');
    line.push(match point.kind {
        MetricKind::Count => 'c',
        MetricKind::Gauge => 'g',
        MetricKind::Histogram => 'h',
    });
    if let Some(rate) = point.sample_rate {
        line.push_str("|@");
        push_f64(&mut line, rate);
    }
    push_tags(&mut line, point.tags, point.host);
    line
}

/// Serializes a Datadog event:
/// `_e{<title_len>,<text_len>}:title|text[|k:...][|p:...][|s:...][|t:...][|h:...][|#tags]`.
///
/// Lengths are byte lengths after newline escaping.
pub(crate) fn event_line(event: &Event<'_>) -> String {
    let title = escape_newlines(event.title);
    let text = escape_newlines(event.text);

    let mut buf = itoa::Buffer::new();
    let mut line = String::with_capacity(32 + title.len() + text.len());
    line.push_str("_e{");
    line.push_str(buf.format(title.len()));
    line.push(',');
    line.push_str(buf.format(text.len()));
    line.push_str("}:");
    line.push_str(&title);
    line.push('|');
    line.push_str(&text);

    if let Some(key) = event.options.aggregation_key {
        line.push_str("|k:");
        line.push_str(key);
    }
    if let Some(priority) = event.options.priority {
        line.push_str("|p:");
        line.push_str(match priority {
            EventPriority::Normal => "normal",
            EventPriority::Low => "low",
        });
    }
    if let Some(source) = event.options.source_type_name {
        line.push_str("|s:");
        line.push_str(source);
    }
    if let Some(alert) = event.options.alert_type {
        line.push_str("|t:");
        line.push_str(match alert {
            EventAlertType::Info => "info",
            EventAlertType::Error => "error",
            EventAlertType::Warning => "warning",
            EventAlertType::Success => "success",
        });
    }
    if let Some(host) = event.host.filter(|host| !host.is_empty()) {
        line.push_str("|h:");
        line.push_str(host);
    }
    // Events carry the host in the `h:` field; no trailing host tag.
    push_tags(&mut line, event.tags, None);
    line
}

/// Serializes a service check:
/// `_sc|name|status[|h:...][|#tags][|m:message]`.
pub(crate) fn check_line(check: &ServiceCheck<'_>) -> String {
    let mut buf = itoa::Buffer::new();
    let mut line = String::with_capacity(32 + check.name.len());
    line.push_str("_sc|");
    line.push_str(check.name);
    line.push('|');
    line.push_str(buf.format(check.status.as_u8()));

    if let Some(host) = check.host.filter(|host| !host.is_empty()) {
        line.push_str("|h:");
        line.push_str(host);
    }
    push_tags(&mut line, check.tags, None);
    // The message must come last; anything after `m:` is part of it.
    if let Some(message) = check.message {
        line.push_str("|m:");
        line.push_str(&escape_newlines(message));
    }
    line
}

fn push_f64(line: &mut String, value: f64) {
    let mut buf = ryu::Buffer::new();
    line.push_str(buf.format(value));
}

fn push_tags(line: &mut String, tags: &[String], host: Option<&str>) {
    let host = host.filter(|host| !host.is_empty());
    if tags.is_empty() && host.is_none() {
        return;
    }
    line.push_str("|#");
    let mut first = true;
    for tag in tags {
        if !first {
            line.push(',');
        }
        line.push_str(tag);
        first = false;
    }
    if let Some(host) = host {
        if !first {
            line.push(',');
        }
        line.push_str("host:");
        line.push_str(host);
    }
}

fn escape_newlines(text: &str) -> String {
    text.replace('\n', "\\n")
}
