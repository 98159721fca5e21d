//! ログイベントのキャプチャ
//!
//! 返り値の `DefaultGuard` をスコープに保持している間、同じスレッドで出力された
//! ログイベントを、それを囲むスパンのフィールドと一緒に記録する。
//! `#[tokio::test]` は単一スレッドのランタイムなので、リクエスト処理中のログも拾える。

use std::sync::{Arc, Mutex};

use tracing::{
    Event,
    Level,
    Subscriber,
    field::{Field, Visit},
    span::{Attributes, Id},
    subscriber::DefaultGuard,
};
use tracing_subscriber::{
    Layer,
    layer::{Context, SubscriberExt},
    registry::LookupSpan,
};

#[derive(Debug, Clone)]
pub struct CapturedEvent {
    pub level:       Level,
    pub message:     String,
    pub fields:      Vec<(String, String)>,
    /// イベントを囲むスパンのフィールド（外側から順）
    pub span_fields: Vec<(String, String)>,
}

impl CapturedEvent {
    pub fn field(&self, name: &str) -> Option<&str> {
        find(&self.fields, name)
    }

    pub fn span_field(&self, name: &str) -> Option<&str> {
        find(&self.span_fields, name)
    }
}

fn find<'a>(fields: &'a [(String, String)], name: &str) -> Option<&'a str> {
    fields
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

#[derive(Debug, Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<CapturedEvent>>>);

impl CapturedLogs {
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.0.lock().unwrap().clone()
    }

    pub fn with_message(&self, message: &str) -> Vec<CapturedEvent> {
        self.events()
            .into_iter()
            .filter(|event| event.message == message)
            .collect()
    }
}

/// キャプチャ用 subscriber をこのスレッドのデフォルトに設定する
pub fn capture() -> (DefaultGuard, CapturedLogs) {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::registry().with(CaptureLayer { logs: logs.clone() });
    (tracing::subscriber::set_default(subscriber), logs)
}

struct CaptureLayer {
    logs: CapturedLogs,
}

/// スパン作成時のフィールド（スパンの拡張領域に保存する）
struct SpanFields(Vec<(String, String)>);

impl<S> Layer<S> for CaptureLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        attrs.record(&mut visitor);

        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(SpanFields(visitor.fields));
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let mut span_fields = Vec::new();
        if let Some(scope) = ctx.event_scope(event) {
            for span in scope.from_root() {
                let extensions = span.extensions();
                if let Some(SpanFields(fields)) = extensions.get::<SpanFields>() {
                    span_fields.extend(fields.iter().cloned());
                }
            }
        }

        self.logs.0.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            message: visitor.message.unwrap_or_default(),
            fields: visitor.fields,
            span_fields,
        });
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    fields:  Vec<(String, String)>,
}

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.record(field, format!("{value:?}"));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.record(field, value.to_string());
    }
}

impl FieldVisitor {
    fn record(&mut self, field: &Field, value: String) {
        if field.name() == "message" {
            self.message = Some(value);
        } else {
            self.fields.push((field.name().to_string(), value));
        }
    }
}
