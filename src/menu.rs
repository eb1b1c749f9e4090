use anyhow::Result;
use std::io::{BufRead, Write};

use crate::api::{HhClient, Transport};
use crate::db::Database;
use crate::import::{import_employers, parse_employer_ids, ImportReport};
use crate::models::VacancyListing;

// --- Output shared by the menu and the one-shot subcommands ---

pub fn write_import_report(out: &mut impl Write, report: &ImportReport) -> Result<()> {
    for id in &report.skipped {
        writeln!(out, "Employer {} not found or request failed.", id)?;
    }
    for employer in &report.employers {
        writeln!(
            out,
            "Imported {} (#{}): {} vacancies fetched, {} new",
            employer.name, employer.hh_id, employer.fetched, employer.inserted
        )?;
    }
    Ok(())
}

pub fn write_counts(out: &mut impl Write, db: &Database) -> Result<()> {
    let counts = db.count_vacancies_per_employer()?;
    if counts.is_empty() {
        writeln!(out, "No employers stored.")?;
    }
    for row in counts {
        writeln!(out, "{}: {}", row.employer_name, row.vacancies)?;
    }
    Ok(())
}

pub fn write_vacancies(out: &mut impl Write, vacancies: &[VacancyListing]) -> Result<()> {
    if vacancies.is_empty() {
        writeln!(out, "No vacancies stored.")?;
    }
    for v in vacancies {
        writeln!(
            out,
            "{} | {} | Salary: {} | URL: {}",
            v.employer_name,
            v.title,
            v.salary_display(),
            v.url.as_deref().unwrap_or("-")
        )?;
    }
    Ok(())
}

pub fn write_average(out: &mut impl Write, db: &Database) -> Result<()> {
    // A zero average is reported as missing data
    match db.average_salary()? {
        Some(avg) if avg != 0.0 => writeln!(out, "Average salary: {:.2}", avg)?,
        _ => writeln!(out, "No salary data to average.")?,
    }
    Ok(())
}

pub fn write_above_average(out: &mut impl Write, db: &Database) -> Result<()> {
    let vacancies = db.list_above_average_salary()?;
    if vacancies.is_empty() {
        writeln!(out, "No vacancies above the average salary, or no salary data.")?;
        return Ok(());
    }
    write_vacancies(out, &vacancies)
}

// --- Interactive menu ---

const MENU: &str = "\
Menu:
1. Import employers and their vacancies
2. Vacancy count per employer
3. All vacancies
4. Average salary
5. Vacancies above the average salary
6. Exit";

/// Runs the numbered menu until the operator picks 6 or input ends.
pub fn run<T: Transport>(
    input: &mut impl BufRead,
    out: &mut impl Write,
    client: &HhClient<T>,
    db: &Database,
    per_page: u32,
) -> Result<()> {
    loop {
        writeln!(out, "\n{}", MENU)?;
        let Some(choice) = prompt(input, out, "Choose an option (1-6): ")? else {
            return Ok(());
        };

        match choice.as_str() {
            "1" => {
                let Some(raw) = prompt(input, out, "Employer IDs, comma-separated (e.g. 12345,67890): ")? else {
                    return Ok(());
                };
                if raw.is_empty() {
                    writeln!(out, "Error: empty input.")?;
                    continue;
                }
                let ids = parse_employer_ids(&raw);
                if ids.is_empty() {
                    writeln!(out, "Error: no valid employer IDs.")?;
                    continue;
                }
                writeln!(out, "Importing...")?;
                let report = import_employers(client, db, &ids, per_page)?;
                write_import_report(out, &report)?;
                writeln!(out, "Import finished.")?;
            }
            "2" => write_counts(out, db)?,
            "3" => write_vacancies(out, &db.list_all_vacancies()?)?,
            "4" => write_average(out, db)?,
            "5" => write_above_average(out, db)?,
            "6" => {
                writeln!(out, "Bye.")?;
                return Ok(());
            }
            _ => writeln!(out, "Invalid choice, try again.")?,
        }
    }
}

/// Prints `label` and reads one trimmed line; `None` on end of input.
fn prompt(input: &mut impl BufRead, out: &mut impl Write, label: &str) -> Result<Option<String>> {
    write!(out, "{}", label)?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::tests::MockTransport;
    use std::io::Cursor;

    fn run_script(script: &str, transport: MockTransport, db: &Database) -> String {
        let client = HhClient::new(transport);
        let mut input = Cursor::new(script.as_bytes().to_vec());
        let mut out = Vec::new();
        run(&mut input, &mut out, &client, db, 100).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn test_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.init().unwrap();
        db
    }

    #[test]
    fn test_menu_import_then_count() {
        let transport = MockTransport::default()
            .employer("1", "Acme")
            .vacancy_pages("1", 100, &[2]);
        let db = test_db();

        let output = run_script("1\n1, 99\n2\n6\n", transport, &db);

        assert!(output.contains("Employer 99 not found or request failed."));
        assert!(output.contains("Imported Acme (#1): 2 vacancies fetched, 2 new"));
        assert!(output.contains("Acme: 2"));
        assert!(output.trim_end().ends_with("Bye."));
    }

    #[test]
    fn test_menu_rejects_blank_ids_and_bad_choice() {
        let db = test_db();
        let output = run_script("1\n\n1\n , ,\n9\n", MockTransport::default(), &db);

        assert!(output.contains("Error: empty input."));
        assert!(output.contains("Error: no valid employer IDs."));
        assert!(output.contains("Invalid choice, try again."));
        assert_eq!(db.employer_count().unwrap(), 0);
    }

    #[test]
    fn test_menu_average_and_listings() {
        let db = test_db();
        let acme = db.upsert_employer("1", "Acme", None).unwrap();
        db.insert_vacancy_if_absent("a", acme, "Dev", Some(1000), Some(2000), Some("RUR"), Some("https://hh.ru/vacancy/a"))
            .unwrap();
        db.insert_vacancy_if_absent("b", acme, "Lead", Some(4000), None, Some("RUR"), None)
            .unwrap();
        db.insert_vacancy_if_absent("c", acme, "Intern", None, None, None, None)
            .unwrap();

        let output = run_script("3\n4\n5\n6\n", MockTransport::default(), &db);

        assert!(output.contains("Acme | Dev | Salary: 1000 - 2000 RUR | URL: https://hh.ru/vacancy/a"));
        assert!(output.contains("Acme | Intern | Salary: not specified | URL: -"));
        assert!(output.contains("Average salary: 2750.00"));
        assert!(output.contains("Acme | Lead | Salary: 4000 -  RUR | URL: -"));
    }

    #[test]
    fn test_menu_lists_empty_store() {
        let db = test_db();
        let output = run_script("3\n6\n", MockTransport::default(), &db);

        assert!(output.contains("No vacancies stored."));
    }

    #[test]
    fn test_zero_average_reported_as_missing() {
        let db = test_db();
        let acme = db.upsert_employer("1", "Acme", None).unwrap();
        db.insert_vacancy_if_absent("z", acme, "Volunteer", Some(0), None, None, None)
            .unwrap();

        let mut out = Vec::new();
        write_average(&mut out, &db).unwrap();
        let output = String::from_utf8(out).unwrap();

        assert_eq!(db.average_salary().unwrap(), Some(0.0));
        assert!(output.contains("No salary data to average."));
        assert!(!output.contains("0.00"));
    }

    #[test]
    fn test_menu_reports_missing_salary_data() {
        let db = test_db();
        let output = run_script("4\n5\n", MockTransport::default(), &db);

        assert!(output.contains("No salary data to average."));
        assert!(output.contains("No vacancies above the average salary, or no salary data."));
    }
}
