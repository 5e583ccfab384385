use anyhow::Result;
use jip_calendar_core::ViewMode;
use jip_calendar_core::settings::{AgendaGroupBy, BadgeVariant, CalendarSettings};
use owo_colors::OwoColorize;

use super::Controller;

pub fn set_view(controller: &mut Controller, view: ViewMode) -> Result<()> {
    controller.set_view(view)?;
    println!("{}", format!("View set to {}", view).green());
    Ok(())
}

/// Apply whichever preferences were given, then print the result.
pub fn run(
    controller: &mut Controller,
    badge: Option<BadgeVariant>,
    use_24_hour: Option<bool>,
    group_by: Option<AgendaGroupBy>,
) -> Result<()> {
    let current = controller.settings();
    let next = apply(current, badge, use_24_hour, group_by);

    if next != current {
        controller.save_settings(next)?;
        println!("{}", "Settings saved".green());
    }

    print_settings(&next);
    Ok(())
}

fn apply(
    mut settings: CalendarSettings,
    badge: Option<BadgeVariant>,
    use_24_hour: Option<bool>,
    group_by: Option<AgendaGroupBy>,
) -> CalendarSettings {
    if let Some(badge) = badge {
        settings.badge_variant = badge;
    }
    if let Some(use_24_hour) = use_24_hour {
        settings.use_24_hour_format = use_24_hour;
    }
    if let Some(group_by) = group_by {
        settings.agenda_mode_group_by = group_by;
    }
    settings
}

fn print_settings(settings: &CalendarSettings) {
    let badge = match settings.badge_variant {
        BadgeVariant::Dot => "dot",
        BadgeVariant::Colored => "colored",
    };
    let clock = if settings.use_24_hour_format { "24-hour" } else { "12-hour" };
    let group_by = match settings.agenda_mode_group_by {
        AgendaGroupBy::Date => "date",
        AgendaGroupBy::Color => "color",
    };

    println!("  {:<10} {}", "view".dimmed(), settings.view);
    println!("  {:<10} {}", "badge".dimmed(), badge);
    println!("  {:<10} {}", "clock".dimmed(), clock);
    println!("  {:<10} {}", "agenda".dimmed(), group_by);
}
