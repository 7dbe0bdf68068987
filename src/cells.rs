//! # Cell Renderers
//!
//! Pure functions from a [`DataStore`] snapshot (plus the current time) to a
//! cell's text and highlight. They never do I/O and never mutate the store,
//! so rendering the same snapshot twice gives the same board.
//!
//! ## Board Layout
//! ```text
//! ┌──────────┬──────────┬─────────────┬─────────┐
//! │ Launches │ Surf     │ Sunrise/set │ Clock   │
//! ├──────────┼──────────┼─────────────┼─────────┤
//! │ Tide     │ Wind     │ Weather     │         │
//! └──────────┴──────────┴─────────────┴─────────┘
//! ```
//!
//! A renderer that fails shows `Error` in its own cell; the rest of the board
//! still renders.

use crate::board::Sink;
use crate::store::DataStore;
use crate::{SunPhase, TideTrend, WaterLevel};
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use thiserror::Error;
use tracing::error;

/// Launch inside this window turns the launch cell green.
const LAUNCH_WATCH_HOURS: i64 = 20;
/// Launch inside this window shows a clock time instead of a countdown.
const LAUNCH_CLOCK_HOURS: i64 = 12;
/// Surf height (ft) that turns the cell red.
const SURF_BIG_FT: i32 = 5;
/// Surf height (ft) that turns the cell green.
const SURF_GOOD_FT: i32 = 3;
/// Wind speed (mph) that turns the cell green.
const WIND_GOOD_MPH: i32 = 11;
/// Precipitation chance (%) above which rain takes over the highlight.
const RAIN_LIKELY_PCT: u8 = 20;
/// Cloud cover (%) at which the weather cell turns yellow.
const OVERCAST_PCT: u8 = 75;

const NOT_AVAILABLE: &str = "N/A";
const ERROR_TEXT: &str = "Error";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Highlight {
    Green,
    Yellow,
    Orange,
    Red,
    LightBlue,
}

/// Text and highlight for one cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellView {
    pub text: String,
    pub highlight: Option<Highlight>,
}

impl CellView {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            highlight: None,
        }
    }

    fn colored(text: impl Into<String>, highlight: Option<Highlight>) -> Self {
        Self {
            text: text.into(),
            highlight,
        }
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum RenderError {
    #[error("{0} is not a finite number")]
    NonFinite(&'static str),
}

/// Everything a renderer may look at besides the store.
#[derive(Clone, Copy, Debug)]
pub struct RenderContext {
    pub now: DateTime<Utc>,
    pub tz: Tz,
    /// How close to sunrise/sunset a launch must be to turn orange
    pub launch_margin: Duration,
}

impl RenderContext {
    fn local_hm(&self, at: DateTime<Utc>) -> String {
        at.with_timezone(&self.tz).format("%H:%M").to_string()
    }
}

pub type Renderer = fn(&DataStore, &RenderContext) -> Result<CellView, RenderError>;

/// A position on the board and the renderer that fills it.
#[derive(Clone, Copy)]
pub struct CellSpec {
    pub position: (usize, usize),
    pub title: &'static str,
    pub render: Renderer,
}

pub const CLOCK_CELL: CellSpec = CellSpec {
    position: (0, 3),
    title: "Clock",
    render: render_clock,
};

pub const BOARD: [CellSpec; 7] = [
    CellSpec {
        position: (0, 0),
        title: "Launches",
        render: render_launches,
    },
    CellSpec {
        position: (0, 1),
        title: "Surf",
        render: render_surf,
    },
    CellSpec {
        position: (0, 2),
        title: "Sunrise/set",
        render: render_sun,
    },
    CLOCK_CELL,
    CellSpec {
        position: (1, 0),
        title: "Tide",
        render: render_tide,
    },
    CellSpec {
        position: (1, 1),
        title: "Wind",
        render: render_wind,
    },
    CellSpec {
        position: (1, 2),
        title: "Weather",
        render: render_weather,
    },
];

/// Render one cell, turning a renderer failure into an `Error` cell.
pub fn render_cell(cell: &CellSpec, store: &DataStore, ctx: &RenderContext) -> CellView {
    match (cell.render)(store, ctx) {
        Ok(view) => view,
        Err(e) => {
            error!(cell = cell.title, error = %e, "Cell render failed");
            CellView::plain(ERROR_TEXT)
        }
    }
}

/// Render `cells` into the sink, one isolated cell at a time.
pub fn render_cells(cells: &[CellSpec], store: &DataStore, ctx: &RenderContext, sink: &mut dyn Sink) {
    for cell in cells {
        let view = render_cell(cell, store, ctx);
        sink.set_cell(cell.position, cell.title, &view.text, view.highlight);
    }
}

/// Full render pass over the board.
pub fn render_all(store: &DataStore, ctx: &RenderContext, sink: &mut dyn Sink) {
    render_cells(&BOARD, store, ctx, sink);
}

pub fn render_launches(store: &DataStore, ctx: &RenderContext) -> Result<CellView, RenderError> {
    let next = store
        .launches
        .as_deref()
        .unwrap_or_default()
        .iter()
        .filter(|launch| launch.scheduled >= ctx.now)
        .min_by_key(|launch| launch.scheduled);
    let Some(launch) = next else {
        return Ok(CellView::plain("None"));
    };

    let until = launch.scheduled - ctx.now;
    let when = if until <= Duration::hours(LAUNCH_CLOCK_HOURS) {
        ctx.local_hm(launch.scheduled)
    } else {
        format!("{}D {}H", until.num_days(), until.num_hours() % 24)
    };

    let mut highlight = None;
    if until <= Duration::hours(LAUNCH_WATCH_HOURS) {
        highlight = Some(Highlight::Green);
    }
    if until <= Duration::hours(LAUNCH_CLOCK_HOURS) {
        if let Some(sun) = &store.sun {
            let near = |edge: DateTime<Utc>| (launch.scheduled - edge).abs() <= ctx.launch_margin;
            if near(sun.sunrise) || near(sun.sunset) {
                highlight = Some(Highlight::Orange);
            }
        }
    }

    Ok(CellView::colored(format!("{}\n{}", launch.name, when), highlight))
}

pub fn render_surf(store: &DataStore, _ctx: &RenderContext) -> Result<CellView, RenderError> {
    let Some(surf) = &store.surf else {
        return Ok(CellView::plain(NOT_AVAILABLE));
    };

    let text = match &surf.water_temp {
        Some(temp) => format!("{}\n{}", surf.text, temp),
        None => surf.text.clone(),
    };
    let highlight = if surf.height_ft >= SURF_BIG_FT {
        Some(Highlight::Red)
    } else if surf.height_ft >= SURF_GOOD_FT {
        Some(Highlight::Green)
    } else {
        None
    };
    Ok(CellView::colored(text, highlight))
}

pub fn render_wind(store: &DataStore, _ctx: &RenderContext) -> Result<CellView, RenderError> {
    let Some(wind) = &store.wind else {
        return Ok(CellView::plain(NOT_AVAILABLE));
    };

    let text = format!("{}g{} {}", wind.speed_mph, wind.gust_mph, wind.direction);
    let rain_coming = store
        .forecast
        .is_some_and(|f| f.precip_48h > RAIN_LIKELY_PCT);
    let highlight = if rain_coming {
        Some(Highlight::LightBlue)
    } else if wind.speed_mph >= WIND_GOOD_MPH {
        Some(Highlight::Green)
    } else {
        None
    };
    Ok(CellView::colored(text, highlight))
}

/// Tide never gets a highlight.
pub fn render_tide(store: &DataStore, ctx: &RenderContext) -> Result<CellView, RenderError> {
    let Some(tide) = &store.tide_level else {
        return Ok(CellView::plain(NOT_AVAILABLE));
    };

    let arrow = match tide.trend {
        TideTrend::Rising => '^',
        TideTrend::Falling | TideTrend::Unknown => 'v',
    };
    let level = match &tide.level {
        WaterLevel::Feet(feet) if !feet.is_finite() => {
            return Err(RenderError::NonFinite("water level"))
        }
        WaterLevel::Feet(feet) => format!("{feet:.1}Ft {arrow}"),
        WaterLevel::Unavailable(sentinel) => format!("{sentinel} {arrow}"),
    };

    let next = match store.tide_event.filter(|event| event.at > ctx.now) {
        Some(event) => {
            let kind = event.kind.to_string();
            format!("{} {}", capitalize_first(&kind), ctx.local_hm(event.at))
        }
        None => "No upcoming tide events".to_string(),
    };
    Ok(CellView::plain(format!("{level}\n{next}")))
}

pub fn render_sun(store: &DataStore, ctx: &RenderContext) -> Result<CellView, RenderError> {
    let Some(sun) = &store.sun else {
        return Ok(CellView::plain(NOT_AVAILABLE));
    };
    let arrow = match sun.next {
        SunPhase::Sunrise => '^',
        SunPhase::Sunset => 'v',
    };
    Ok(CellView::plain(format!("{} {}", ctx.local_hm(sun.at), arrow)))
}

pub fn render_weather(store: &DataStore, _ctx: &RenderContext) -> Result<CellView, RenderError> {
    let Some(forecast) = &store.forecast else {
        return Ok(CellView::plain(NOT_AVAILABLE));
    };

    let temp = |t: Option<i32>| t.map_or_else(|| "--".to_string(), |t| t.to_string());
    let text = format!(
        "{}°/{}°\nCloud {}% Rain {}%",
        temp(forecast.high_f),
        temp(forecast.low_f),
        forecast.cloud_cover,
        forecast.precip_today
    );
    let highlight = if forecast.precip_today > RAIN_LIKELY_PCT {
        Some(Highlight::LightBlue)
    } else if forecast.cloud_cover >= OVERCAST_PCT {
        Some(Highlight::Yellow)
    } else {
        None
    };
    Ok(CellView::colored(text, highlight))
}

pub fn render_clock(store: &DataStore, ctx: &RenderContext) -> Result<CellView, RenderError> {
    let clock = ctx.now.with_timezone(&ctx.tz).format("%H:%M:%S");
    let updated = match store.last_update {
        Some(at) => format!("Updated {}m ago", (ctx.now - at).num_minutes().max(0)),
        None => format!("Updated {NOT_AVAILABLE}"),
    };
    Ok(CellView::plain(format!("{clock}\n{updated}")))
}

/// "HIGH TIDE" → "High tide"
fn capitalize_first(text: &str) -> String {
    let lower = text.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
