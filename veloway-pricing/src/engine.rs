use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use veloway_offer::{Offer, OfferStatus, VehicleType};
use veloway_shared::{haversine_km, round2, Route};

/// Tunable pricing constants. Defaults are the platform's standard rates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateCard {
    pub car_rate_per_km: f64,
    pub bike_rate_per_km: f64,
    pub night_multiplier: f64,
    /// Night pricing applies from this hour (inclusive)...
    pub night_start_hour: u32,
    /// ...until this hour (exclusive).
    pub night_end_hour: u32,
    pub high_supply_multiplier: f64,
    pub low_supply_multiplier: f64,
    /// At or above this many competing offers the discount kicks in.
    pub high_supply_threshold: usize,
    /// Below this many competing offers the surge kicks in.
    pub low_supply_threshold: usize,
    pub platform_fee_rate: f64,
    pub minimum_platform_fee: f64,
}

impl Default for RateCard {
    fn default() -> Self {
        Self {
            car_rate_per_km: 8.0,
            bike_rate_per_km: 5.0,
            night_multiplier: 1.3,
            night_start_hour: 22,
            night_end_hour: 6,
            high_supply_multiplier: 0.92,
            low_supply_multiplier: 1.25,
            high_supply_threshold: 5,
            low_supply_threshold: 2,
            platform_fee_rate: 0.10,
            minimum_platform_fee: 5.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SupplyLevel {
    Low,
    Normal,
    High,
}

/// One labelled line of the fare computation, for display and audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FareStage {
    pub label: String,
    pub amount: f64,
}

/// The three amounts frozen onto a booking at creation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fare {
    pub amount: f64,
    pub platform_fee: f64,
    pub total_amount: f64,
}

/// Full fare computation result. `total_amount == final_price + platform_fee`
/// holds by construction; all amounts carry 2 decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FareBreakdown {
    pub distance_km: f64,
    pub rate_per_km: f64,
    pub base_fare: f64,
    pub time_multiplier: f64,
    pub supply_multiplier: f64,
    pub supply_level: SupplyLevel,
    pub final_price: f64,
    pub platform_fee: f64,
    pub total_amount: f64,
    pub stages: Vec<FareStage>,
}

impl FareBreakdown {
    pub fn fare(&self) -> Fare {
        Fare {
            amount: self.final_price,
            platform_fee: self.platform_fee,
            total_amount: self.total_amount,
        }
    }
}

/// Pure fare computation from route, vehicle type and offer timing/supply
/// context. No side effects; the caller supplies the competing-offer set.
#[derive(Debug, Clone, Default)]
pub struct PricingEngine {
    rates: RateCard,
}

impl PricingEngine {
    pub fn new(rates: RateCard) -> Self {
        Self { rates }
    }

    pub fn rates(&self) -> &RateCard {
        &self.rates
    }

    /// Quote a pooling fare for the passenger's (sub-)route on an offer
    /// departing at `departure`, against the current open-offer supply.
    pub fn quote(
        &self,
        passenger_route: &Route,
        vehicle: VehicleType,
        departure: NaiveTime,
        competing: &[Offer],
        exclude: Option<Uuid>,
    ) -> FareBreakdown {
        let distance_km = round2(haversine_km(
            passenger_route.from.point,
            passenger_route.to.point,
        ));
        let (supply_level, _) = self.supply_level(passenger_route, competing, exclude);
        self.quote_for_distance(distance_km, vehicle, departure, supply_level)
    }

    /// The fare formula itself, from an already-measured distance.
    pub fn quote_for_distance(
        &self,
        distance_km: f64,
        vehicle: VehicleType,
        departure: NaiveTime,
        supply_level: SupplyLevel,
    ) -> FareBreakdown {
        let rate_per_km = match vehicle {
            VehicleType::Car => self.rates.car_rate_per_km,
            VehicleType::Bike => self.rates.bike_rate_per_km,
        };
        let base_fare = round2(distance_km * rate_per_km);

        let time_multiplier = self.time_multiplier(departure);
        let supply_multiplier = self.supply_multiplier(supply_level);

        let final_price = round2(base_fare * time_multiplier * supply_multiplier);
        let platform_fee = round2(
            (final_price * self.rates.platform_fee_rate).max(self.rates.minimum_platform_fee),
        );
        let total_amount = round2(final_price + platform_fee);

        let mut stages = vec![FareStage {
            label: format!("Base fare ({distance_km:.2} km @ {rate_per_km}/km)"),
            amount: base_fare,
        }];
        if time_multiplier != 1.0 {
            stages.push(FareStage {
                label: format!("Night hours x{time_multiplier}"),
                amount: round2(base_fare * time_multiplier),
            });
        }
        if supply_multiplier != 1.0 {
            let label = match supply_level {
                SupplyLevel::High => format!("High supply x{supply_multiplier}"),
                SupplyLevel::Low => format!("Low supply x{supply_multiplier}"),
                SupplyLevel::Normal => unreachable!(),
            };
            stages.push(FareStage {
                label,
                amount: final_price,
            });
        }
        stages.push(FareStage {
            label: "Platform fee".to_string(),
            amount: platform_fee,
        });

        FareBreakdown {
            distance_km,
            rate_per_km,
            base_fare,
            time_multiplier,
            supply_multiplier,
            supply_level,
            final_price,
            platform_fee,
            total_amount,
            stages,
        }
    }

    /// Rental fare: hourly rate over the booked duration, through the same
    /// platform-fee policy as pooling.
    pub fn rental_fare(&self, hourly_rate: f64, hours: f64) -> Fare {
        let amount = round2(hourly_rate * hours);
        let platform_fee = round2(
            (amount * self.rates.platform_fee_rate).max(self.rates.minimum_platform_fee),
        );
        Fare {
            amount,
            platform_fee,
            total_amount: round2(amount + platform_fee),
        }
    }

    fn time_multiplier(&self, departure: NaiveTime) -> f64 {
        let hour = departure.hour();
        if hour >= self.rates.night_start_hour || hour < self.rates.night_end_hour {
            self.rates.night_multiplier
        } else {
            1.0
        }
    }

    fn supply_multiplier(&self, level: SupplyLevel) -> f64 {
        match level {
            SupplyLevel::High => self.rates.high_supply_multiplier,
            SupplyLevel::Low => self.rates.low_supply_multiplier,
            SupplyLevel::Normal => 1.0,
        }
    }

    /// Classify supply by counting other open pooling offers whose route's
    /// bounding rectangle contains both passenger endpoints. The rectangle
    /// containment is an approximation of route overlap, kept for parity
    /// with observed platform behaviour, not a geometric guarantee.
    pub fn supply_level(
        &self,
        passenger_route: &Route,
        competing: &[Offer],
        exclude: Option<Uuid>,
    ) -> (SupplyLevel, usize) {
        let count = competing
            .iter()
            .filter(|offer| exclude.map_or(true, |id| offer.id != id))
            .filter(|offer| {
                matches!(
                    offer.status,
                    OfferStatus::Pending | OfferStatus::Active | OfferStatus::Booked
                )
            })
            .filter(|offer| {
                offer.route().is_some_and(|route| {
                    let bbox = route.bounding_box();
                    bbox.contains(passenger_route.from.point)
                        && bbox.contains(passenger_route.to.point)
                })
            })
            .count();

        let level = if count >= self.rates.high_supply_threshold {
            SupplyLevel::High
        } else if count < self.rates.low_supply_threshold {
            SupplyLevel::Low
        } else {
            SupplyLevel::Normal
        };
        (level, count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use veloway_offer::{TripOperator, Vehicle};
    use veloway_shared::Place;

    fn engine() -> PricingEngine {
        PricingEngine::default()
    }

    fn time(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    #[test]
    fn test_daytime_high_supply_car_fare() {
        // 10 km car trip at midday with 5+ competitors:
        // 10 * 8 * 1.0 * 0.92 = 73.6, fee max(7.36, 5) = 7.36
        let quote = engine().quote_for_distance(10.0, VehicleType::Car, time(12, 0), SupplyLevel::High);

        assert_eq!(quote.base_fare, 80.0);
        assert_eq!(quote.final_price, 73.6);
        assert_eq!(quote.platform_fee, 7.36);
        assert_eq!(quote.total_amount, 80.96);
        assert_eq!(quote.total_amount, round2(quote.final_price + quote.platform_fee));
    }

    #[test]
    fn test_bike_rate_and_fee_floor() {
        // 2 km bike trip: base 10, fee floors at 5
        let quote = engine().quote_for_distance(2.0, VehicleType::Bike, time(10, 0), SupplyLevel::Normal);

        assert_eq!(quote.base_fare, 10.0);
        assert_eq!(quote.final_price, 10.0);
        assert_eq!(quote.platform_fee, 5.0);
        assert_eq!(quote.total_amount, 15.0);
    }

    #[test]
    fn test_night_hour_boundaries() {
        let engine = engine();
        let multiplier_at = |h: u32, m: u32| {
            engine
                .quote_for_distance(10.0, VehicleType::Car, time(h, m), SupplyLevel::Normal)
                .time_multiplier
        };

        assert_eq!(multiplier_at(22, 0), 1.3);
        assert_eq!(multiplier_at(23, 59), 1.3);
        assert_eq!(multiplier_at(0, 30), 1.3);
        assert_eq!(multiplier_at(5, 59), 1.3);
        assert_eq!(multiplier_at(6, 0), 1.0);
        assert_eq!(multiplier_at(21, 59), 1.0);
    }

    #[test]
    fn test_low_supply_surge() {
        let quote = engine().quote_for_distance(10.0, VehicleType::Car, time(12, 0), SupplyLevel::Low);
        assert_eq!(quote.final_price, 100.0);
        assert_eq!(quote.platform_fee, 10.0);
    }

    #[test]
    fn test_breakdown_stages_are_labelled() {
        let quote = engine().quote_for_distance(10.0, VehicleType::Car, time(23, 0), SupplyLevel::High);

        assert_eq!(quote.stages.len(), 4);
        assert!(quote.stages[0].label.starts_with("Base fare"));
        assert!(quote.stages[1].label.starts_with("Night hours"));
        assert!(quote.stages[2].label.starts_with("High supply"));
        assert_eq!(quote.stages[3].label, "Platform fee");
    }

    fn competitor(from: (f64, f64), to: (f64, f64)) -> Offer {
        Offer::new_pooling(
            TripOperator::driver(Uuid::new_v4(), "driver"),
            NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
            Vehicle {
                vehicle_type: VehicleType::Car,
                model: "Swift".to_string(),
                plate: "KA-01-AA-0001".to_string(),
            },
            Route::new(Place::new("a", from.0, from.1), Place::new("b", to.0, to.1)),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            3,
        )
    }

    #[test]
    fn test_supply_counts_only_containing_rectangles() {
        let engine = engine();
        let passenger = Route::new(
            Place::new("from", 12.95, 77.60),
            Place::new("to", 13.00, 77.65),
        );

        // One competitor spanning the passenger route, one far away
        let spanning = competitor((12.90, 77.50), (13.10, 77.70));
        let elsewhere = competitor((18.50, 73.80), (18.60, 73.95));

        let (level, count) =
            engine.supply_level(&passenger, &[spanning.clone(), elsewhere], None);
        assert_eq!(count, 1);
        assert_eq!(level, SupplyLevel::Low);

        // The quoted offer itself never counts toward its own supply
        let (_, count) = engine.supply_level(&passenger, &[spanning.clone()], Some(spanning.id));
        assert_eq!(count, 0);
    }

    #[test]
    fn test_supply_thresholds() {
        let engine = engine();
        let passenger = Route::new(
            Place::new("from", 12.95, 77.60),
            Place::new("to", 13.00, 77.65),
        );
        let spanning: Vec<Offer> = (0..5)
            .map(|_| competitor((12.90, 77.50), (13.10, 77.70)))
            .collect();

        let (level, _) = engine.supply_level(&passenger, &spanning[..5], None);
        assert_eq!(level, SupplyLevel::High);

        let (level, _) = engine.supply_level(&passenger, &spanning[..3], None);
        assert_eq!(level, SupplyLevel::Normal);

        let (level, _) = engine.supply_level(&passenger, &spanning[..1], None);
        assert_eq!(level, SupplyLevel::Low);
    }

    #[test]
    fn test_rental_fare_uses_same_fee_policy() {
        let fare = engine().rental_fare(80.0, 2.5);
        assert_eq!(fare.amount, 200.0);
        assert_eq!(fare.platform_fee, 20.0);
        assert_eq!(fare.total_amount, 220.0);

        // Short cheap rentals still pay the minimum fee
        let fare = engine().rental_fare(15.0, 2.0);
        assert_eq!(fare.platform_fee, 5.0);
    }
}
