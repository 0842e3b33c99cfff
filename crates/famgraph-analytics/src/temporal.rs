//! Time-based patterns: when tasks get created, when events cluster, when
//! monitoring (stress) peaks, seasonal surges, and weekly rhythm variance.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Timelike, Utc};
use famgraph_core::{Result, SeverityThresholds, TenantId};
use famgraph_graph::{decode_rows, CatalogQuery, QueryRunner, TemporalRow};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const EVENT_TIMESTAMPS_QUERY: &str = "MATCH (e:Event {tenantId: $tenantId}) \
     WHERE e.startTime IS NOT NULL \
     RETURN e.startTime AS timestamp, e.title AS title \
     ORDER BY e.startTime ASC";

const MONITORING_TIMESTAMPS_QUERY: &str = "MATCH (p:Person {tenantId: $tenantId})-[m:MONITORS]->(t:Task) \
     WHERE m.timestamp IS NOT NULL \
     RETURN m.timestamp AS timestamp, p.name AS person, t.title AS title \
     ORDER BY m.timestamp ASC";

const DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

fn day_name(index: usize) -> &'static str {
    DAY_NAMES[index % 7]
}

fn hour_label(hour: u32) -> &'static str {
    match hour {
        6..=8 => "early morning",
        9..=11 => "late morning",
        12..=16 => "afternoon",
        17..=20 => "evening",
        21..=23 => "night",
        _ => "overnight",
    }
}

/// Activity counts per day of week, Sunday first.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct DayOfWeekCounts {
    #[serde(rename = "Sunday")]
    pub sunday: u64,
    #[serde(rename = "Monday")]
    pub monday: u64,
    #[serde(rename = "Tuesday")]
    pub tuesday: u64,
    #[serde(rename = "Wednesday")]
    pub wednesday: u64,
    #[serde(rename = "Thursday")]
    pub thursday: u64,
    #[serde(rename = "Friday")]
    pub friday: u64,
    #[serde(rename = "Saturday")]
    pub saturday: u64,
}

impl From<[u64; 7]> for DayOfWeekCounts {
    fn from(buckets: [u64; 7]) -> Self {
        Self {
            sunday: buckets[0],
            monday: buckets[1],
            tuesday: buckets[2],
            wednesday: buckets[3],
            thursday: buckets[4],
            friday: buckets[5],
            saturday: buckets[6],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeakDay {
    pub day: &'static str,
    pub count: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeakHour {
    pub hour: u32,
    pub count: u64,
    pub percentage: f64,
    pub label: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCreationPatterns {
    pub day_of_week: DayOfWeekCounts,
    pub hour_of_day: BTreeMap<u32, u64>,
    pub peak_day: Option<PeakDay>,
    pub peak_hour: Option<PeakHour>,
    pub sunday_night_spike: bool,
    pub sunday_night_percentage: f64,
    pub insight: String,
}

/// Event counts per coarse time-of-day band.
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeOfDayCounts {
    pub early_morning: u64,
    pub late_morning: u64,
    pub afternoon: u64,
    pub evening: u64,
    pub night: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPatterns {
    pub day_of_week: DayOfWeekCounts,
    pub time_of_day: TimeOfDayCounts,
    pub busiest_day: Option<PeakDay>,
    pub busiest_time: Option<(&'static str, u64)>,
    pub insight: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StressPatterns {
    pub day_of_week: DayOfWeekCounts,
    pub highest_stress_day: Option<PeakDay>,
    pub insight: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonalPatterns {
    pub monthly_distribution: Vec<(&'static str, u64)>,
    pub back_to_school_spike: bool,
    pub holiday_spike: bool,
    pub insight: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyRhythm {
    pub weekly_rhythm: DayOfWeekCounts,
    pub rhythm_score: f64,
    pub interpretation: &'static str,
    pub insight: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemporalReport {
    pub tenant_id: TenantId,
    pub generated_at: String,
    pub task_creation: TaskCreationPatterns,
    pub events: EventPatterns,
    pub stress: StressPatterns,
    pub seasonal: SeasonalPatterns,
    pub weekly: WeeklyRhythm,
    pub summary: String,
}

#[derive(Debug, Deserialize)]
struct TimestampRow {
    timestamp: String,
}

pub struct TemporalPatternDetector {
    runner: Arc<dyn QueryRunner>,
    thresholds: SeverityThresholds,
}

impl TemporalPatternDetector {
    pub fn new(runner: Arc<dyn QueryRunner>, thresholds: SeverityThresholds) -> Self {
        Self { runner, thresholds }
    }

    async fn task_timestamps(&self, tenant: &TenantId) -> Result<Vec<DateTime<Utc>>> {
        let rows = self
            .runner
            .run_catalog(CatalogQuery::TemporalTaskCreation, tenant)
            .await?;
        let rows: Vec<TemporalRow> = decode_rows(rows)?;
        Ok(parse_timestamps(rows.iter().map(|r| r.timestamp.as_str())))
    }

    async fn event_timestamps(&self, tenant: &TenantId) -> Result<Vec<DateTime<Utc>>> {
        let rows = self.runner.run_cypher(EVENT_TIMESTAMPS_QUERY, tenant).await?;
        let rows: Vec<TimestampRow> = decode_rows(rows)?;
        Ok(parse_timestamps(rows.iter().map(|r| r.timestamp.as_str())))
    }

    async fn monitoring_timestamps(&self, tenant: &TenantId) -> Result<Vec<DateTime<Utc>>> {
        let rows = self
            .runner
            .run_cypher(MONITORING_TIMESTAMPS_QUERY, tenant)
            .await?;
        let rows: Vec<TimestampRow> = decode_rows(rows)?;
        Ok(parse_timestamps(rows.iter().map(|r| r.timestamp.as_str())))
    }

    /// When tasks get created, including the late-Sunday planning spike.
    pub async fn analyze_task_creation_patterns(
        &self,
        tenant: &TenantId,
    ) -> Result<TaskCreationPatterns> {
        let timestamps = self.task_timestamps(tenant).await?;

        if timestamps.is_empty() {
            return Ok(TaskCreationPatterns {
                day_of_week: DayOfWeekCounts::default(),
                hour_of_day: BTreeMap::new(),
                peak_day: None,
                peak_hour: None,
                sunday_night_spike: false,
                sunday_night_percentage: 0.0,
                insight: "Not enough task data to detect creation patterns yet.".to_string(),
            });
        }

        let day_buckets = bucket_by_day(&timestamps);
        let mut hour_of_day: BTreeMap<u32, u64> = BTreeMap::new();
        for ts in &timestamps {
            *hour_of_day.entry(ts.hour()).or_insert(0) += 1;
        }

        let total = timestamps.len() as u64;
        let sunday_night = timestamps
            .iter()
            .filter(|ts| ts.weekday().num_days_from_sunday() == 0 && ts.hour() >= 18)
            .count() as u64;
        let sunday_night_percentage = sunday_night as f64 / total as f64 * 100.0;
        let sunday_night_spike =
            sunday_night as f64 / total as f64 > self.thresholds.sunday_night_share;

        let peak_day = peak_of(&day_buckets, total);
        let peak_hour = hour_of_day
            .iter()
            .max_by_key(|(_, count)| **count)
            .map(|(&hour, &count)| PeakHour {
                hour,
                count,
                percentage: count as f64 / total as f64 * 100.0,
                label: hour_label(hour),
            });

        let insight = match (&peak_day, sunday_night_spike) {
            (Some(day), true) => format!(
                "Tasks are most often created on {} ({} tasks, {:.0}%), with a significant \
                 Sunday night planning spike ({:.1}% of all tasks created Sunday 6pm-11pm). \
                 This indicates invisible planning labor concentrated at week's end.",
                day.day, day.count, day.percentage, sunday_night_percentage
            ),
            (Some(day), false) => {
                let hour_part = peak_hour
                    .as_ref()
                    .map(|h| format!(" Peak creation hour: {} ({} tasks).", h.label, h.count))
                    .unwrap_or_default();
                format!(
                    "Tasks are most often created on {} ({} tasks, {:.0}%).{}",
                    day.day, day.count, day.percentage, hour_part
                )
            }
            (None, _) => "Not enough task data to detect creation patterns yet.".to_string(),
        };

        Ok(TaskCreationPatterns {
            day_of_week: day_buckets.into(),
            hour_of_day,
            peak_day,
            peak_hour,
            sunday_night_spike,
            sunday_night_percentage,
            insight,
        })
    }

    /// When scheduled events cluster across the week and the day.
    pub async fn analyze_event_patterns(&self, tenant: &TenantId) -> Result<EventPatterns> {
        let timestamps = self.event_timestamps(tenant).await?;

        if timestamps.is_empty() {
            return Ok(EventPatterns {
                day_of_week: DayOfWeekCounts::default(),
                time_of_day: TimeOfDayCounts::default(),
                busiest_day: None,
                busiest_time: None,
                insight: "Not enough event data to detect patterns yet.".to_string(),
            });
        }

        let day_buckets = bucket_by_day(&timestamps);
        let mut bands = TimeOfDayCounts::default();
        for ts in &timestamps {
            match ts.hour() {
                6..=8 => bands.early_morning += 1,
                9..=11 => bands.late_morning += 1,
                12..=16 => bands.afternoon += 1,
                17..=20 => bands.evening += 1,
                21..=23 => bands.night += 1,
                _ => {}
            }
        }

        let total = timestamps.len() as u64;
        let busiest_day = peak_of(&day_buckets, total);
        let band_counts = [
            ("early morning", bands.early_morning),
            ("late morning", bands.late_morning),
            ("afternoon", bands.afternoon),
            ("evening", bands.evening),
            ("night", bands.night),
        ];
        let busiest_time = band_counts.into_iter().max_by_key(|(_, count)| *count);

        let insight = match (&busiest_day, busiest_time) {
            (Some(day), Some((band, count))) => format!(
                "Events concentrate on {} ({} events, {:.0}%), mostly during the {} ({:.0}% of \
                 events). This shows your family's activity rhythm.",
                day.day,
                day.count,
                day.percentage,
                band,
                count as f64 / total as f64 * 100.0
            ),
            _ => "Not enough event data to detect patterns yet.".to_string(),
        };

        Ok(EventPatterns {
            day_of_week: day_buckets.into(),
            time_of_day: bands,
            busiest_day,
            busiest_time,
            insight,
        })
    }

    /// Monitoring actions as a stress proxy: which day follow-ups peak on.
    pub async fn detect_stress_patterns(&self, tenant: &TenantId) -> Result<StressPatterns> {
        let timestamps = self.monitoring_timestamps(tenant).await?;

        if timestamps.is_empty() {
            return Ok(StressPatterns {
                day_of_week: DayOfWeekCounts::default(),
                highest_stress_day: None,
                insight: "Not enough monitoring data to detect stress patterns yet.".to_string(),
            });
        }

        let day_buckets = bucket_by_day(&timestamps);
        let total = timestamps.len() as u64;
        let highest = peak_of(&day_buckets, total);

        let insight = match &highest {
            Some(day) => format!(
                "Monitoring burden peaks on {} ({} follow-up actions, {:.0}% of all monitoring). \
                 This suggests {} is the highest stress day.",
                day.day, day.count, day.percentage, day.day
            ),
            None => "Not enough monitoring data to detect stress patterns yet.".to_string(),
        };

        Ok(StressPatterns {
            day_of_week: day_buckets.into(),
            highest_stress_day: highest,
            insight,
        })
    }

    /// Back-to-school (Aug+Sep) and holiday (Nov+Dec) surges in task creation.
    pub async fn detect_seasonal_patterns(&self, tenant: &TenantId) -> Result<SeasonalPatterns> {
        let timestamps = self.task_timestamps(tenant).await?;

        if timestamps.is_empty() {
            return Ok(SeasonalPatterns {
                monthly_distribution: MONTH_NAMES.iter().map(|&m| (m, 0)).collect(),
                back_to_school_spike: false,
                holiday_spike: false,
                insight: "Not enough data to detect seasonal patterns yet.".to_string(),
            });
        }

        let mut months = [0u64; 12];
        for ts in &timestamps {
            months[ts.month0() as usize] += 1;
        }

        let total = timestamps.len() as f64;
        let back_to_school_spike = (months[7] + months[8]) as f64 / total > self.thresholds.seasonal_share;
        let holiday_spike = (months[10] + months[11]) as f64 / total > self.thresholds.seasonal_share;

        let mut spikes = Vec::new();
        if back_to_school_spike {
            spikes.push("back-to-school (August/September)");
        }
        if holiday_spike {
            spikes.push("holiday season (November/December)");
        }

        let insight = if spikes.is_empty() {
            "Task creation is relatively consistent year-round.".to_string()
        } else {
            format!(
                "Task creation spikes during {}, indicating increased coordination burden during \
                 these periods.",
                spikes.join(" and ")
            )
        };

        Ok(SeasonalPatterns {
            monthly_distribution: MONTH_NAMES
                .iter()
                .enumerate()
                .map(|(i, &m)| (m, months[i]))
                .collect(),
            back_to_school_spike,
            holiday_spike,
            insight,
        })
    }

    /// Coefficient of variation of combined task+event activity across the
    /// seven day buckets. High variance means the week has hot spots.
    pub async fn analyze_weekly_rhythms(&self, tenant: &TenantId) -> Result<WeeklyRhythm> {
        let (tasks, events) = tokio::join!(
            self.task_timestamps(tenant),
            self.event_timestamps(tenant)
        );
        let mut activities = tasks?;
        activities.extend(events?);

        if activities.is_empty() {
            return Ok(WeeklyRhythm {
                weekly_rhythm: DayOfWeekCounts::default(),
                rhythm_score: 0.0,
                interpretation: "consistent",
                insight: "Not enough data to analyze weekly rhythms yet.".to_string(),
            });
        }

        let day_buckets = bucket_by_day(&activities);
        let mean = day_buckets.iter().sum::<u64>() as f64 / 7.0;
        let variance = day_buckets
            .iter()
            .map(|&count| (count as f64 - mean).powi(2))
            .sum::<f64>()
            / 7.0;
        let rhythm_score = if mean == 0.0 {
            0.0
        } else {
            variance.sqrt() / mean
        };

        let interpretation = if rhythm_score > self.thresholds.rhythm_cv_high {
            "highly variable"
        } else if rhythm_score > self.thresholds.rhythm_cv_medium {
            "moderately variable"
        } else {
            "consistent"
        };

        let insight = if rhythm_score > self.thresholds.rhythm_cv_high {
            let busiest = day_buckets
                .iter()
                .enumerate()
                .max_by_key(|(_, &count)| count)
                .map(|(i, _)| day_name(i))
                .unwrap_or("Sunday");
            format!(
                "Highly variable weekly rhythm (score: {rhythm_score:.2}). {busiest} carries a \
                 disproportionate share of activity. This variation may create stress."
            )
        } else {
            format!(
                "Consistent weekly rhythm (score: {rhythm_score:.2}). Activities are evenly \
                 distributed across the week, reducing overwhelm."
            )
        };

        Ok(WeeklyRhythm {
            weekly_rhythm: day_buckets.into(),
            rhythm_score,
            interpretation,
            insight,
        })
    }

    /// Run every temporal analysis concurrently and combine them. A failing
    /// analysis degrades to an empty block; it never aborts the others.
    pub async fn analyze_temporal_patterns(&self, tenant: &TenantId) -> TemporalReport {
        info!(tenant = %tenant, "analyzing temporal patterns");

        let (task_creation, events, stress, seasonal, weekly) = tokio::join!(
            self.analyze_task_creation_patterns(tenant),
            self.analyze_event_patterns(tenant),
            self.detect_stress_patterns(tenant),
            self.detect_seasonal_patterns(tenant),
            self.analyze_weekly_rhythms(tenant),
        );

        let task_creation = task_creation.unwrap_or_else(|e| {
            warn!(error = %e, "task creation pattern analysis failed");
            TaskCreationPatterns {
                day_of_week: DayOfWeekCounts::default(),
                hour_of_day: BTreeMap::new(),
                peak_day: None,
                peak_hour: None,
                sunday_night_spike: false,
                sunday_night_percentage: 0.0,
                insight: format!("Task creation analysis unavailable: {e}"),
            }
        });
        let events = events.unwrap_or_else(|e| {
            warn!(error = %e, "event pattern analysis failed");
            EventPatterns {
                day_of_week: DayOfWeekCounts::default(),
                time_of_day: TimeOfDayCounts::default(),
                busiest_day: None,
                busiest_time: None,
                insight: format!("Event pattern analysis unavailable: {e}"),
            }
        });
        let stress = stress.unwrap_or_else(|e| {
            warn!(error = %e, "stress pattern analysis failed");
            StressPatterns {
                day_of_week: DayOfWeekCounts::default(),
                highest_stress_day: None,
                insight: format!("Stress pattern analysis unavailable: {e}"),
            }
        });
        let seasonal = seasonal.unwrap_or_else(|e| {
            warn!(error = %e, "seasonal pattern analysis failed");
            SeasonalPatterns {
                monthly_distribution: MONTH_NAMES.iter().map(|&m| (m, 0)).collect(),
                back_to_school_spike: false,
                holiday_spike: false,
                insight: format!("Seasonal analysis unavailable: {e}"),
            }
        });
        let weekly = weekly.unwrap_or_else(|e| {
            warn!(error = %e, "weekly rhythm analysis failed");
            WeeklyRhythm {
                weekly_rhythm: DayOfWeekCounts::default(),
                rhythm_score: 0.0,
                interpretation: "consistent",
                insight: format!("Weekly rhythm analysis unavailable: {e}"),
            }
        });

        let summary = temporal_summary(&task_creation, &seasonal, &weekly, &self.thresholds);

        TemporalReport {
            tenant_id: tenant.clone(),
            generated_at: Utc::now().to_rfc3339(),
            task_creation,
            events,
            stress,
            seasonal,
            weekly,
            summary,
        }
    }
}

fn parse_timestamps<'a>(raw: impl Iterator<Item = &'a str>) -> Vec<DateTime<Utc>> {
    raw.filter_map(|s| {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                warn!(timestamp = s, error = %e, "skipping unparsable timestamp");
                e
            })
            .ok()
    })
    .collect()
}

fn bucket_by_day(timestamps: &[DateTime<Utc>]) -> [u64; 7] {
    let mut buckets = [0u64; 7];
    for ts in timestamps {
        buckets[ts.weekday().num_days_from_sunday() as usize] += 1;
    }
    buckets
}

fn peak_of(buckets: &[u64; 7], total: u64) -> Option<PeakDay> {
    if total == 0 {
        return None;
    }
    buckets
        .iter()
        .enumerate()
        .max_by_key(|(_, &count)| count)
        .map(|(i, &count)| PeakDay {
            day: day_name(i),
            count,
            percentage: count as f64 / total as f64 * 100.0,
        })
}

fn temporal_summary(
    task_creation: &TaskCreationPatterns,
    seasonal: &SeasonalPatterns,
    weekly: &WeeklyRhythm,
    thresholds: &SeverityThresholds,
) -> String {
    let mut findings = Vec::new();

    if task_creation.sunday_night_spike {
        findings.push(format!(
            "Sunday night planning spike ({:.1}% of tasks)",
            task_creation.sunday_night_percentage
        ));
    }
    if seasonal.back_to_school_spike {
        findings.push("back-to-school coordination surge".to_string());
    }
    if seasonal.holiday_spike {
        findings.push("holiday season coordination surge".to_string());
    }
    if weekly.rhythm_score > thresholds.rhythm_cv_high {
        findings.push("highly variable weekly rhythm".to_string());
    }

    if findings.is_empty() {
        "Your family has relatively consistent temporal patterns with no major spikes or stress \
         points detected."
            .to_string()
    } else {
        format!(
            "Temporal patterns detected: {}. These patterns reveal when invisible labor \
             concentrates.",
            findings.join(", ")
        )
    }
}
