//! `nutrilog day` and `nutrilog history`: read-only views over the store.

use anyhow::Result;
use chrono::{NaiveDate, Utc};

use nutrilog_core::aggregate::{self, Period, PeriodSummary};
use nutrilog_core::store::Store;
use nutrilog_core::{FoodEntry, NutritionFacts};

use crate::args;
use crate::config::Config;
use crate::sqlite_store::SqliteStore;

/// Print one day's entries grouped by meal, followed by the day's totals.
pub async fn run_day(config: &Config, date: Option<String>) -> Result<()> {
    let date = args::parse_date(date.as_deref())?;
    let store = SqliteStore::open(config).await?;
    let entries = store.entries_for_day(date).await;
    store.close().await;

    print_day(date, &entries?);
    Ok(())
}

fn print_day(date: NaiveDate, entries: &[FoodEntry]) {
    println!("Food log for {}", date);
    println!("========================");

    if entries.is_empty() {
        println!("No entries.");
        return;
    }

    for (meal, group) in aggregate::by_meal(entries) {
        if group.is_empty() {
            continue;
        }
        println!();
        println!("{}:", capitalize(meal.as_str()));
        for entry in group {
            println!(
                "  #{:<4} {} {:<24} {:>7.1} kcal",
                entry.id,
                entry.occurred_at.with_timezone(&chrono::Local).format("%H:%M"),
                entry.food_name,
                entry.facts.calories,
            );
        }
    }

    println!();
    print_facts("Total", &aggregate::totals(entries));
}

/// Print per-day totals for the period and the per-day averages.
pub async fn run_history(config: &Config, period: &str) -> Result<()> {
    let Some(period) = Period::parse(period) else {
        anyhow::bail!("Unknown period: '{}'. Must be week or month.", period);
    };
    let now = Utc::now();
    let (start, end) = period.window(now);

    let store = SqliteStore::open(config).await?;
    let entries = store.entries_in_range(start, end).await;
    store.close().await;

    print_history(period, &aggregate::summarize(&entries?, period, now));
    Ok(())
}

fn print_history(period: Period, summary: &PeriodSummary) {
    println!("History (last {} days)", period.days());
    println!("========================");

    if summary.days.is_empty() {
        println!("No entries.");
        return;
    }

    println!(
        "  {:<10} {:>9} {:>9} {:>9} {:>9}",
        "date", "kcal", "protein", "carbs", "fat"
    );
    for day in &summary.days {
        println!(
            "  {:<10} {:>9.1} {:>9.1} {:>9.1} {:>9.1}",
            day.date.to_string(),
            day.calories,
            day.protein,
            day.carbs,
            day.fat
        );
    }

    println!();
    print_facts(
        &format!("Average over {} logged day(s)", summary.days.len()),
        &summary.average,
    );
}

fn print_facts(label: &str, facts: &NutritionFacts) {
    println!(
        "{}: {:.1} kcal, protein {:.1}g, carbs {:.1}g, fat {:.1}g",
        label, facts.calories, facts.protein, facts.carbs, facts.fat
    );
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
