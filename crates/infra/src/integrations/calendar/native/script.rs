//! AppleScript generation for the native calendar application.

use chrono::{Datelike, NaiveDate};

/// Escape a value for inclusion inside an AppleScript string literal.
pub fn escape_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn name_list(selected: &[String]) -> String {
    let names: Vec<String> = selected
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .map(|name| format!("\"{}\"", escape_literal(name)))
        .collect();
    format!("{{{}}}", names.join(", "))
}

const EVENT_LINES: &str = r#"            set dayEvents to (every event of cal whose start date < dayEnd and end date > dayStart)
            repeat with ev in dayEvents
                set evTitle to ""
                try
                    set evTitle to summary of ev
                end try
                set end of output to evTitle & "|" & ((start date of ev) as string) & "|" & ((end date of ev) as string) & "|" & calName
            end repeat
"#;

/// Script listing the events of `day` that overlap the local day window.
///
/// Each event becomes one `title|start|end|calendar` item of the returned
/// list. An empty `selected` walks every calendar; otherwise only the named
/// calendars are looked up, and names that no longer exist are skipped.
pub fn extraction_script(day: NaiveDate, selected: &[String]) -> String {
    let wanted = name_list(selected);
    let calendars = if wanted == "{}" {
        format!(
            r#"    repeat with cal in every calendar
        set calName to name of cal
{EVENT_LINES}    end repeat
"#
        )
    } else {
        format!(
            r#"    repeat with wantedName in wanted
        set calName to wantedName as string
        set cal to missing value
        try
            set cal to calendar calName
        end try
        if cal is not missing value then
{EVENT_LINES}        end if
    end repeat
"#
        )
    };

    format!(
        r#"set dayStart to current date
set day of dayStart to 1
set year of dayStart to {year}
set month of dayStart to {month}
set day of dayStart to {day}
set time of dayStart to 0
set dayEnd to dayStart + (1 * days)
set wanted to {wanted}
set output to {{}}
tell application "Calendar"
{calendars}end tell
return output
"#,
        year = day.year(),
        month = day.month(),
        day = day.day(),
    )
}

/// Script listing every calendar as `name<TAB>writable<TAB>r/g/b<TAB>kind`.
pub fn discovery_script() -> String {
    r#"set output to {}
tell application "Calendar"
    repeat with cal in every calendar
        set calName to name of cal
        set calWritable to writable of cal
        set calColor to color of cal
        set colorText to ((item 1 of calColor) as string) & "/" & ((item 2 of calColor) as string) & "/" & ((item 3 of calColor) as string)
        if calWritable then
            set calKind to "local"
        else
            set calKind to "subscribed"
        end if
        set end of output to calName & tab & (calWritable as string) & tab & colorText & tab & calKind
    end repeat
end tell
return output
"#
    .to_string()
}
