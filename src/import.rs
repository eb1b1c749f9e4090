use anyhow::Result;
use std::slice;
use tracing::info;

use crate::api::{parse_salary, HhClient, Transport};
use crate::db::Database;

#[derive(Debug, Clone, PartialEq)]
pub struct EmployerImport {
    pub hh_id: String,
    pub name: String,
    pub fetched: usize,
    pub inserted: usize,
}

#[derive(Debug, Default)]
pub struct ImportReport {
    pub employers: Vec<EmployerImport>,
    pub skipped: Vec<String>,
}

/// Splits comma-separated employer IDs, dropping blanks.
pub fn parse_employer_ids(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(String::from)
        .collect()
}

/// Fetches each employer and all of its vacancies and stores them. Unknown or
/// unreachable employers are skipped; database errors abort the import.
pub fn import_employers<T: Transport>(
    client: &HhClient<T>,
    db: &Database,
    ids: &[String],
    per_page: u32,
) -> Result<ImportReport> {
    let mut report = ImportReport::default();

    for id in ids {
        let Some(employer) = client.fetch_employers(slice::from_ref(id)).into_iter().next() else {
            report.skipped.push(id.clone());
            continue;
        };

        let employer_key = db.upsert_employer(
            &employer.id,
            &employer.name,
            employer.alternate_url.as_deref(),
        )?;

        let vacancies = client.fetch_vacancies(&employer.id, per_page);
        let mut inserted = 0;
        for vacancy in &vacancies {
            let (salary_from, salary_to, currency) = parse_salary(vacancy.salary.as_ref());
            if db.insert_vacancy_if_absent(
                &vacancy.id,
                employer_key,
                &vacancy.name,
                salary_from,
                salary_to,
                currency.as_deref(),
                vacancy.alternate_url.as_deref(),
            )? {
                inserted += 1;
            }
        }

        info!(
            employer = %employer.name,
            fetched = vacancies.len(),
            inserted,
            "imported employer"
        );
        report.employers.push(EmployerImport {
            hh_id: employer.id,
            name: employer.name,
            fetched: vacancies.len(),
            inserted,
        });
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::tests::{MockTransport, Scripted};

    fn test_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.init().unwrap();
        db
    }

    fn ids(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_employer_ids() {
        assert_eq!(parse_employer_ids("12345, 67890"), ids(&["12345", "67890"]));
        assert_eq!(parse_employer_ids(" 1 ,, 2 , "), ids(&["1", "2"]));
        assert!(parse_employer_ids("").is_empty());
        assert!(parse_employer_ids(" , ,").is_empty());
    }

    #[test]
    fn test_import_stores_employers_and_vacancies() {
        let transport = MockTransport::default()
            .employer("1", "Acme")
            .vacancy_pages("1", 100, &[100, 100, 1])
            .employer("2", "Globex")
            .vacancy_pages("2", 100, &[2]);
        let client = HhClient::new(transport);
        let db = test_db();

        let report = import_employers(&client, &db, &ids(&["1", "2"]), 100).unwrap();

        assert!(report.skipped.is_empty());
        assert_eq!(report.employers.len(), 2);
        assert_eq!(report.employers[0].fetched, 201);
        assert_eq!(report.employers[0].inserted, 201);
        assert_eq!(db.employer_count().unwrap(), 2);
        assert_eq!(db.vacancy_count().unwrap(), 203);

        let counts = db.count_vacancies_per_employer().unwrap();
        assert_eq!(counts[0].employer_name, "Acme");
        assert_eq!(counts[0].vacancies, 201);
    }

    #[test]
    fn test_reimport_does_not_duplicate() {
        let transport = MockTransport::default()
            .employer("1", "Acme")
            .vacancy_pages("1", 100, &[3]);
        let client = HhClient::new(transport);
        let db = test_db();

        import_employers(&client, &db, &ids(&["1"]), 100).unwrap();
        let second = import_employers(&client, &db, &ids(&["1"]), 100).unwrap();

        assert_eq!(second.employers[0].fetched, 3);
        assert_eq!(second.employers[0].inserted, 0);
        assert_eq!(db.employer_count().unwrap(), 1);
        assert_eq!(db.vacancy_count().unwrap(), 3);
    }

    #[test]
    fn test_import_skips_unknown_and_failing_employers() {
        let transport = MockTransport::default()
            .respond("/employers/404", Scripted::NotFound)
            .respond("/employers/500", Scripted::Status(500))
            .employer("7", "Initech")
            .vacancy_pages("7", 50, &[1]);
        let client = HhClient::new(transport);
        let db = test_db();

        let report = import_employers(&client, &db, &ids(&["404", "7", "500"]), 50).unwrap();

        assert_eq!(report.skipped, ids(&["404", "500"]));
        assert_eq!(report.employers.len(), 1);
        assert_eq!(report.employers[0].name, "Initech");
        assert_eq!(db.vacancy_count().unwrap(), 1);
    }

    #[test]
    fn test_import_keeps_salary_fields() {
        let page = serde_json::json!({
            "pages": 1,
            "items": [
                {"id": "v1", "name": "Rust Dev", "salary": {"from": 1000, "to": 2000, "currency": "RUR"}, "alternate_url": "https://hh.ru/vacancy/v1"},
                {"id": "v2", "name": "Intern", "salary": null}
            ]
        });
        let transport = MockTransport::default()
            .employer("3", "Acme")
            .respond(
                "/vacancies?employer_id=3&per_page=100&page=0",
                Scripted::Body(page.to_string()),
            );
        let client = HhClient::new(transport);
        let db = test_db();

        import_employers(&client, &db, &ids(&["3"]), 100).unwrap();

        let all = db.list_all_vacancies().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].salary_from, Some(1000));
        assert_eq!(all[0].salary_to, Some(2000));
        assert_eq!(all[0].salary_currency.as_deref(), Some("RUR"));
        assert_eq!(all[0].url.as_deref(), Some("https://hh.ru/vacancy/v1"));
        assert_eq!(all[1].salary_from, None);
        assert_eq!(db.average_salary().unwrap(), Some(1500.0));
    }
}
