use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{FixedOffset, NaiveDate};
use salah::prelude::*;

use crate::config::CityConfig;
use crate::models::PrayerName;
use crate::traits::{AdhanLookup, AdhanTimes};

/// Offline adhan lookup: the configured city's coordinates fed through the
/// `salah` astronomical calculation, reported in the city's UTC offset.
pub struct SalahAdhanLookup {
    cities: Vec<CityConfig>,
}

impl SalahAdhanLookup {
    pub fn new(cities: Vec<CityConfig>) -> Result<Self> {
        // Validate method + madhab early
        for city in &cities {
            parse_method(&city.calc_method)?;
            parse_madhab(&city.madhab)?;
        }
        Ok(Self { cities })
    }

    fn city(&self, name: &str) -> Result<&CityConfig> {
        self.cities
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| anyhow!("No coordinates configured for city '{}'", name))
    }

    pub fn compute(&self, city: &str, date: NaiveDate) -> Result<AdhanTimes> {
        let city = self.city(city)?;
        let coords = Coordinates::new(city.latitude, city.longitude);
        let params = Configuration::with(parse_method(&city.calc_method)?, parse_madhab(&city.madhab)?);

        let times = PrayerSchedule::new()
            .on(date)
            .for_location(coords)
            .with_configuration(params)
            .calculate()
            .map_err(|e| anyhow!("Prayer calculation failed: {}", e))?;

        let offset = FixedOffset::east_opt(city.timezone_offset * 60)
            .ok_or_else(|| anyhow!("Invalid timezone offset: {}", city.timezone_offset))?;

        let local = |prayer: Prayer| -> String {
            times
                .time(prayer)
                .with_timezone(&offset)
                .format("%H:%M")
                .to_string()
        };

        Ok(AdhanTimes::from([
            (PrayerName::Fajr, local(Prayer::Fajr)),
            (PrayerName::Dhuhr, local(Prayer::Dhuhr)),
            (PrayerName::Asr, local(Prayer::Asr)),
            (PrayerName::Maghrib, local(Prayer::Maghrib)),
            (PrayerName::Isha, local(Prayer::Isha)),
        ]))
    }
}

#[async_trait]
impl AdhanLookup for SalahAdhanLookup {
    async fn adhan_times(&self, city: &str, date: NaiveDate) -> Result<AdhanTimes> {
        self.compute(city, date)
    }
}

fn parse_method(s: &str) -> Result<Method> {
    match s {
        "MuslimWorldLeague" => Ok(Method::MuslimWorldLeague),
        "Egyptian" => Ok(Method::Egyptian),
        "Karachi" => Ok(Method::Karachi),
        "UmmAlQura" => Ok(Method::UmmAlQura),
        "Dubai" => Ok(Method::Dubai),
        "MoonsightingCommittee" => Ok(Method::MoonsightingCommittee),
        "NorthAmerica" => Ok(Method::NorthAmerica),
        "Kuwait" => Ok(Method::Kuwait),
        "Qatar" => Ok(Method::Qatar),
        "Singapore" => Ok(Method::Singapore),
        "Tehran" => Ok(Method::Tehran),
        "Turkey" => Ok(Method::Turkey),
        "Other" => Ok(Method::Other),
        _ => Err(anyhow!("Unknown calculation method: '{}'", s)),
    }
}

fn parse_madhab(s: &str) -> Result<Madhab> {
    match s {
        "Hanafi" => Ok(Madhab::Hanafi),
        "Shafi" | "Shafi'i" => Ok(Madhab::Shafi),
        _ => Err(anyhow!("Unknown madhab: '{}'", s)),
    }
}
