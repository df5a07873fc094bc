//! `key=value` log lines for `--log.format=logfmt`.

use std::{borrow::Cow, fmt, fmt::Write as _};

use tracing::{
    Event, Level, Subscriber,
    field::{Field, Visit},
};
use tracing_subscriber::{
    fmt::{
        FmtContext, FormatEvent, FormatFields, FormattedFields,
        format::Writer,
        time::{FormatTime, SystemTime},
    },
    registry::LookupSpan,
};

/// Event formatter writing one logfmt line per event:
/// `ts=… level=info target=… span=… msg="…" key=value`.
///
/// Span fields are appended as recorded by the layer's field formatter.
#[derive(Debug, Clone, Default)]
pub struct Logfmt<T = SystemTime> {
    timer: T,
}

impl<T> Logfmt<T> {
    pub fn with_timer(timer: T) -> Self {
        Self { timer }
    }
}

impl<S, N, T> FormatEvent<S, N> for Logfmt<T>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
    T: FormatTime,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let meta = event.metadata();
        writer.write_str("ts=")?;
        self.timer.format_time(&mut writer)?;
        write!(
            writer,
            " level={} target={}",
            level_name(meta.level()),
            meta.target()
        )?;

        if let Some(scope) = ctx.event_scope() {
            for span in scope.from_root() {
                write!(writer, " span={}", span.name())?;
                let extensions = span.extensions();
                if let Some(fields) = extensions.get::<FormattedFields<N>>()
                    && !fields.is_empty()
                {
                    write!(writer, " {fields}")?;
                }
            }
        }

        let mut fields = FieldWriter {
            writer: &mut writer,
            result: Ok(()),
        };
        event.record(&mut fields);
        fields.result?;
        writeln!(writer)
    }
}

fn level_name(level: &Level) -> &'static str {
    match *level {
        Level::TRACE => "trace",
        Level::DEBUG => "debug",
        Level::INFO => "info",
        Level::WARN => "warn",
        _ => "error",
    }
}

/// Quotes values that would otherwise break the `key=value` grammar.
fn quote(value: &str) -> Cow<'_, str> {
    let bare = !value.is_empty()
        && !value.chars().any(|c| {
            c.is_whitespace() || c.is_control() || c == '"' || c == '='
        });
    if bare {
        Cow::Borrowed(value)
    } else {
        Cow::Owned(format!("{value:?}"))
    }
}

struct FieldWriter<'a, 'w> {
    writer: &'a mut Writer<'w>,
    result: fmt::Result,
}

impl FieldWriter<'_, '_> {
    fn write(&mut self, field: &Field, value: &str) {
        if self.result.is_err() {
            return;
        }
        let key = match field.name() {
            "message" => "msg",
            name => name,
        };
        self.result = write!(self.writer, " {key}={}", quote(value));
    }
}

impl Visit for FieldWriter<'_, '_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.write(field, value);
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.write(field, &format!("{value:?}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        io,
        sync::{Arc, Mutex},
    };
    use tracing::{error, info, info_span};

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn fixed_time(writer: &mut Writer<'_>) -> fmt::Result {
        writer.write_str("2024-01-01T00:00:00Z")
    }

    fn capture(emit: impl FnOnce()) -> String {
        let buffer = Buffer::default();
        let sink = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .event_format(Logfmt::with_timer(
                fixed_time as fn(&mut Writer<'_>) -> fmt::Result,
            ))
            .with_writer(move || sink.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, emit);
        let bytes = buffer.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn events_become_key_value_lines() {
        let line = capture(|| {
            info!(count = 2, organization = "acme", "discovered organizations")
        });

        assert_eq!(
            line,
            format!(
                "ts=2024-01-01T00:00:00Z level=info target={} \
                 msg=\"discovered organizations\" count=2 organization=acme\n",
                module_path!()
            )
        );
    }

    #[test]
    fn span_context_and_quoting() {
        let line = capture(|| {
            let span = info_span!("scraper", scraper = "workspaces");
            let _entered = span.enter();
            error!(error = %"rate limited (429)", "error scraping");
        });

        assert!(line.starts_with("ts=2024-01-01T00:00:00Z level=error "));
        assert!(line.contains(" span=scraper scraper=\"workspaces\""));
        assert!(line.contains(" msg=\"error scraping\""));
        assert!(line.ends_with(" error=\"rate limited (429)\"\n"));
    }

    #[test]
    fn bare_values_stay_unquoted() {
        assert_eq!(quote("acme"), "acme");
        assert_eq!(quote(""), "\"\"");
        assert_eq!(quote("a=b"), "\"a=b\"");
        assert_eq!(quote("say \"hi\""), "\"say \\\"hi\\\"\"");
    }
}
