use std::str::FromStr;

use anyhow::Result;
use tracing::{Level, Subscriber};
use tracing_subscriber::{
    fmt, layer::SubscriberExt, registry::LookupSpan, util::SubscriberInitExt, EnvFilter, Layer,
    Registry,
};

use crate::settings::{LogFormat, LogProperties};

fn format_layer<S>(format: LogFormat) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    // Results are printed to stdout, logs go to stderr.
    let f = fmt::layer()
        .with_writer(std::io::stderr)
        .with_thread_ids(true)
        .with_thread_names(true);
    match format {
        LogFormat::Compact => f.compact().boxed(),
        LogFormat::Json => f.json().boxed(),
    }
}

/// Returns the filter directives for the given log settings.
pub fn directives(log: &LogProperties) -> Result<String> {
    Ok(match &log.filter {
        Some(filter) => filter.clone(),
        None => {
            let level = Level::from_str(&log.level)?;
            format!(
                "yao={level},yao_cli={level},yao_session={level},yao_ot={level},yao_core={level}"
            )
        }
    })
}

pub fn init_tracing(log: &LogProperties) -> Result<()> {
    let filter_layer = EnvFilter::builder().parse(directives(log)?)?;

    Registry::default()
        .with(filter_layer)
        .with(format_layer(log.format))
        .try_init()?;

    Ok(())
}
