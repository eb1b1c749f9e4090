use serde::{Deserialize, Serialize};

/// A vacancy joined with its employer's name, as shown in listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VacancyListing {
    pub employer_name: String,
    pub title: String,
    pub salary_from: Option<i64>,
    pub salary_to: Option<i64>,
    pub salary_currency: Option<String>,
    pub url: Option<String>,
}

impl VacancyListing {
    pub fn salary_display(&self) -> String {
        if self.salary_from.is_none() && self.salary_to.is_none() {
            return "not specified".to_string();
        }
        let from = self.salary_from.map(|v| v.to_string()).unwrap_or_default();
        let to = self.salary_to.map(|v| v.to_string()).unwrap_or_default();
        let currency = self.salary_currency.as_deref().unwrap_or("");
        format!("{} - {} {}", from, to, currency).trim().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployerVacancyCount {
    pub employer_name: String,
    pub vacancies: i64,
}

// --- Payloads returned by the job-listing API ---

#[derive(Debug, Clone, Deserialize)]
pub struct EmployerData {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub alternate_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SalaryData {
    #[serde(default)]
    pub from: Option<i64>,
    #[serde(default)]
    pub to: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VacancyData {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub salary: Option<SalaryData>,
    #[serde(default)]
    pub alternate_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VacancyPage {
    pub items: Vec<VacancyData>,
    pub pages: i64,
}
