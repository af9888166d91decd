//! Synthetic student records for seeding
//!
//! Records are built as raw `StudentInput` and pushed through the same
//! validation as user input, so a seeded row can never violate a rule a real
//! one would have to satisfy. Emails derive from the student id, which keeps
//! them unique whenever the business key is.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{CoreError, Result};
use crate::models::{Gender, NewStudent, StudentInput};

const SUPPORTED_LOCALES: &str = "en_US, zh_CN";

/// Word lists available to the generator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locale {
    EnUs,
    ZhCn,
}

impl FromStr for Locale {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().replace('-', "_").to_ascii_lowercase().as_str() {
            "en_us" | "en" => Ok(Self::EnUs),
            "zh_cn" | "zh" => Ok(Self::ZhCn),
            _ => Err(CoreError::UnsupportedLocale {
                locale: s.to_owned(),
                supported: SUPPORTED_LOCALES,
            }),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EnUs => f.write_str("en_US"),
            Self::ZhCn => f.write_str("zh_CN"),
        }
    }
}

struct WordLists {
    given_names: &'static [&'static str],
    family_names: &'static [&'static str],
    /// (major, class code)
    majors: &'static [(&'static str, &'static str)],
    cities: &'static [&'static str],
    streets: &'static [&'static str],
}

const EN_US: WordLists = WordLists {
    given_names: &[
        "James", "Mary", "Robert", "Patricia", "Michael", "Jennifer", "David", "Linda",
        "Daniel", "Emily", "Kevin", "Sarah", "Jason", "Laura", "Ryan", "Megan",
    ],
    family_names: &[
        "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis",
        "Wilson", "Anderson", "Taylor", "Thomas", "Moore", "Martin", "Lee", "Clark",
    ],
    majors: &[
        ("Computer Science", "CS"),
        ("Software Engineering", "SE"),
        ("Artificial Intelligence", "AI"),
        ("Data Science", "DS"),
        ("Cybersecurity", "CY"),
        ("Electrical Engineering", "EE"),
        ("Telecommunications", "TC"),
        ("Automation", "AU"),
        ("Finance", "FN"),
        ("Law", "LW"),
        ("English", "EN"),
    ],
    cities: &["Springfield", "Riverside", "Fairview", "Madison", "Georgetown", "Salem"],
    streets: &["Oak", "Maple", "Cedar", "Elm", "Pine", "Washington", "Lake", "Hill"],
};

const ZH_CN: WordLists = WordLists {
    given_names: &[
        "伟", "芳", "娜", "敏", "静", "磊", "洋", "艳", "勇", "军", "杰", "娟", "涛", "明", "超", "秀英",
    ],
    family_names: &["王", "李", "张", "刘", "陈", "杨", "黄", "赵", "吴", "周", "徐", "孙"],
    majors: &[
        ("计算机科学与技术", "CS"),
        ("软件工程", "SE"),
        ("人工智能", "AI"),
        ("数据科学", "DS"),
        ("网络安全", "CY"),
        ("电子信息工程", "EE"),
        ("通信工程", "TC"),
        ("自动化", "AU"),
        ("金融学", "FN"),
        ("法学", "LW"),
        ("英语", "EN"),
    ],
    cities: &["北京", "上海", "广州", "深圳", "杭州", "成都", "武汉", "南京"],
    streets: &["中山", "人民", "解放", "建设", "和平", "新华", "长江", "文化"],
};

/// Produces valid synthetic students
pub struct DataGenerator {
    locale: Locale,
    rng: StdRng,
}

impl DataGenerator {
    /// Generator seeded from OS entropy.
    pub fn new(locale: &str) -> Result<Self> {
        Ok(Self {
            locale: locale.parse()?,
            rng: StdRng::from_entropy(),
        })
    }

    /// Deterministic generator; the same seed yields the same records.
    pub fn with_seed(locale: &str, seed: u64) -> Result<Self> {
        Ok(Self {
            locale: locale.parse()?,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    fn words(&self) -> &'static WordLists {
        match self.locale {
            Locale::EnUs => &EN_US,
            Locale::ZhCn => &ZH_CN,
        }
    }

    fn pick(&mut self, items: &'static [&'static str]) -> &'static str {
        items[self.rng.gen_range(0..items.len())]
    }

    fn full_name(&mut self) -> String {
        let words = self.words();
        let given = self.pick(words.given_names);
        let family = self.pick(words.family_names);
        match self.locale {
            Locale::EnUs => format!("{} {}", given, family),
            Locale::ZhCn => format!("{}{}", family, given),
        }
    }

    fn phone(&mut self) -> String {
        match self.locale {
            Locale::EnUs => format!(
                "({}) {}-{:04}",
                self.rng.gen_range(201..=989),
                self.rng.gen_range(200..=999),
                self.rng.gen_range(0..10_000)
            ),
            Locale::ZhCn => format!(
                "+86 1{}{} {:04} {:04}",
                self.rng.gen_range(3..=9),
                self.rng.gen_range(0..=9),
                self.rng.gen_range(0..10_000),
                self.rng.gen_range(0..10_000)
            ),
        }
    }

    fn address(&mut self) -> String {
        let words = self.words();
        let city = self.pick(words.cities);
        let street = self.pick(words.streets);
        let number = self.rng.gen_range(1..=999);
        match self.locale {
            Locale::EnUs => format!("{} {} St, {}", number, street, city),
            Locale::ZhCn => format!("{}市{}路{}号", city, street, number),
        }
    }

    /// Raw record for position `index` of a batch.
    ///
    /// Enrollment falls on September 1st of one of the last four years and
    /// students are 18-22 at enrollment, which keeps them inside the age
    /// window on `today`.
    pub fn generate_input(&mut self, index: usize, today: NaiveDate) -> StudentInput {
        let enroll_year = today.year() - self.rng.gen_range(0..=3);
        let age_at_enrollment = self.rng.gen_range(18..=22);
        let birth_year = enroll_year - age_at_enrollment;
        let date_of_birth = NaiveDate::from_ymd_opt(
            birth_year,
            self.rng.gen_range(1..=9),
            self.rng.gen_range(1..=28),
        );
        let enrollment_date = NaiveDate::from_ymd_opt(enroll_year, 9, 1);

        let student_id = format!(
            "S{}{:05}{}",
            enroll_year,
            index,
            self.rng.gen_range(10..=99)
        );
        let words = self.words();
        let (major, code) = words.majors[self.rng.gen_range(0..words.majors.len())];
        let class_name = format!("{}{}-{:02}", code, enroll_year, self.rng.gen_range(1..=4));
        let gender = Gender::ALL[self.rng.gen_range(0..Gender::ALL.len())];
        let gpa = (self.rng.gen_range(2.0..=4.0_f64) * 100.0).round() / 100.0;

        StudentInput {
            email: Some(format!("{}@university.edu", student_id.to_ascii_lowercase())),
            student_id: Some(student_id),
            name: Some(self.full_name()),
            gender: Some(gender.as_str().to_owned()),
            date_of_birth: date_of_birth.map(|d| d.format("%Y-%m-%d").to_string()),
            enrollment_date: enrollment_date.map(|d| d.format("%Y-%m-%d").to_string()),
            major: Some(major.to_owned()),
            class_name: Some(class_name),
            phone: Some(self.phone()),
            address: Some(self.address()),
            gpa: Some(gpa),
            status: Some("active".to_owned()),
            scholarship_amount: Some(0.0),
            emergency_contact_name: Some(self.full_name()),
            emergency_contact_phone: Some(self.phone()),
        }
    }

    /// Generate `count` validated students.
    pub fn generate_students(&mut self, count: usize, today: NaiveDate) -> Result<Vec<NewStudent>> {
        (0..count)
            .map(|index| {
                let input = self.generate_input(index, today);
                NewStudent::validate_on(&input, today).map_err(CoreError::from)
            })
            .collect()
    }
}
