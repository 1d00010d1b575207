//! A dike-ring flood management model.
//!
//! A compact stand-in for the classic flood risk planning problem: a river
//! reach protected by three dike rings, uncertain breach dynamics and
//! discounting on one side, and levers for structural heightening,
//! room-for-the-river projects, and early warning on the other. The
//! hydraulics are a smooth surrogate rather than a routed simulation, but
//! the trade-offs are the real ones: crest raises cut damage at superlinear
//! cost, river widening lowers the peak stage, and warning days trade
//! evacuation cost against lives.

use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand_distr::Distribution;

use whatif_core::model::{
    Dimension, DimensionKind, Model, ModelError, Policy, RunContext, RunOutput, Scenario, Value,
};

/// Dike rings along the protected reach.
pub const REACHES: usize = 3;

/// Peak stage reduction from one active room-for-the-river project.
const RFR_STAGE_REDUCTION: f64 = 0.3;
/// Fraction of the failure probability surviving each decimeter of crest raise.
const CREST_PROTECTION: f64 = 0.75;
/// Log-scale sigma of the multiplicative noise on damage and deaths.
const NOISE_SIGMA: f64 = 0.2;
/// Planning horizon in years for discounting annual damage.
const HORIZON_YEARS: i32 = 75;

/// The dike-ring model: five uncertainties, seven levers, five outcomes.
pub struct DikeModel {
    uncertainties: Vec<Dimension>,
    levers: Vec<Dimension>,
    outcomes: Vec<String>,
}

impl DikeModel {
    #[must_use]
    pub fn new() -> Self {
        let uncertainties = vec![
            // Final breach width in meters.
            Dimension::continuous("bmax", DimensionKind::Uncertainty, 30.0, 350.0)
                .with_reference(175.0),
            // Breach growth rate family.
            Dimension::categorical("brate", DimensionKind::Uncertainty, ["1.0", "1.5", "10"])
                .with_reference("1.5"),
            // Probability that a loaded dike section fails.
            Dimension::continuous("pfail", DimensionKind::Uncertainty, 0.0, 1.0),
            // Discount rate in percent, as debated policy positions.
            Dimension::categorical(
                "discount_rate",
                DimensionKind::Uncertainty,
                ["1.5", "2.5", "3.5", "4.5"],
            )
            .with_reference("3.5"),
            // Index into the historical hydrograph record.
            Dimension::integer("flood_wave_shape", DimensionKind::Uncertainty, 0, 132)
                .with_reference(4i64),
        ];

        // Lever references all default to their low end, so the reference
        // policy is the do-nothing baseline.
        let mut levers = vec![Dimension::integer(
            "days_to_threat",
            DimensionKind::Lever,
            0,
            4,
        )];
        for reach in 0..REACHES {
            levers.push(Dimension::integer(
                format!("rfr_{reach}"),
                DimensionKind::Lever,
                0,
                1,
            ));
        }
        for reach in 0..REACHES {
            levers.push(Dimension::integer(
                format!("dike_increase_{reach}"),
                DimensionKind::Lever,
                0,
                10,
            ));
        }

        let outcomes = [
            "expected_annual_damage",
            "dike_investment_costs",
            "rfr_investment_costs",
            "evacuation_costs",
            "expected_number_of_deaths",
        ]
        .map(String::from)
        .to_vec();

        Self {
            uncertainties,
            levers,
            outcomes,
        }
    }
}

impl Default for DikeModel {
    fn default() -> Self {
        Self::new()
    }
}

impl Model for DikeModel {
    fn uncertainties(&self) -> &[Dimension] {
        &self.uncertainties
    }

    fn levers(&self) -> &[Dimension] {
        &self.levers
    }

    fn outcomes(&self) -> &[String] {
        &self.outcomes
    }

    fn run(
        &self,
        scenario: &Scenario,
        policy: &Policy,
        ctx: &RunContext,
    ) -> Result<RunOutput, ModelError> {
        let bmax = numeric(scenario.value("bmax"), "bmax")?;
        let brate = level(scenario.value("brate"), "brate")?;
        let pfail = numeric(scenario.value("pfail"), "pfail")?;
        let discount = level(scenario.value("discount_rate"), "discount_rate")? / 100.0;
        let wave = numeric(scenario.value("flood_wave_shape"), "flood_wave_shape")?;

        let days = numeric(policy.value("days_to_threat"), "days_to_threat")?;

        // Peak load of the breach episode. Wave shapes index a family of
        // hydrographs whose peaks spread smoothly over the record.
        let wave_peak = 1.0 + 0.4 * (std::f64::consts::PI * wave / 132.0).sin();
        let breach_load = bmax * brate * wave_peak;

        let mut rng = SmallRng::seed_from_u64(ctx.seed);
        let damage_noise = noise(&mut rng)?;
        let death_noise = noise(&mut rng)?;

        let mut annual_damage = 0.0;
        let mut dike_costs = 0.0;
        let mut rfr_costs = 0.0;
        for reach in 0..REACHES {
            let rfr = numeric(policy.value(&format!("rfr_{reach}")), "rfr")?;
            let crest = numeric(
                policy.value(&format!("dike_increase_{reach}")),
                "dike_increase",
            )?;

            let stage = breach_load * (1.0 - RFR_STAGE_REDUCTION * rfr);
            let failure = pfail * CREST_PROTECTION.powf(crest);
            annual_damage += 0.02 * stage * failure;

            // Crest raises price in land acquisition, so cost grows faster
            // than height.
            dike_costs += crest * (42.0 + 8.0 * crest);
            rfr_costs += rfr * 120.0;
        }
        annual_damage *= damage_noise;

        // Present value of the damage stream over the planning horizon.
        let annuity = (1.0 - (1.0 + discount).powi(-HORIZON_YEARS)) / discount;
        let damage = annual_damage * annuity;

        // Each warning day empties more of the polder; the exposed fraction
        // bottoms out at the people who stay behind.
        let exposed = (1.0 - 0.18 * days).max(0.1);
        let deaths = 1e-4 * damage * exposed * death_noise;
        let evacuation = 0.21 * days * breach_load * pfail / 100.0;

        Ok(RunOutput::new()
            .scalar("expected_annual_damage", damage)
            .scalar("dike_investment_costs", dike_costs)
            .scalar("rfr_investment_costs", rfr_costs)
            .scalar("evacuation_costs", evacuation)
            .scalar("expected_number_of_deaths", deaths))
    }
}

/// Numeric view of a bound input value.
fn numeric(value: Option<&Value>, name: &str) -> Result<f64, ModelError> {
    value
        .and_then(Value::as_f64)
        .ok_or_else(|| ModelError::new(format!("missing numeric input '{name}'")))
}

/// A categorical level parsed as the number it names.
fn level(value: Option<&Value>, name: &str) -> Result<f64, ModelError> {
    let text = value
        .and_then(Value::as_level)
        .ok_or_else(|| ModelError::new(format!("missing categorical input '{name}'")))?;
    text.parse()
        .map_err(|_| ModelError::new(format!("level '{text}' of '{name}' is not numeric")))
}

fn noise<R: rand::Rng>(rng: &mut R) -> Result<f64, ModelError> {
    rand_distr::LogNormal::new(0.0, NOISE_SIGMA)
        .map(|d| d.sample(rng))
        .map_err(|_| ModelError::new("noise distribution rejected its parameters"))
}
