use super::error::FireError;
use super::types::{AllocationLine, AllocationSpec, AllocationTable, OpportunityCatalog};

/// Joins allocation lines against the catalog and spreads `pool_total` across them.
pub fn assemble(
    opportunities: &OpportunityCatalog,
    allocation: &[AllocationSpec],
    pool_total: f64,
) -> Result<AllocationTable, FireError> {
    let lines = allocation
        .iter()
        .map(|spec| {
            let opportunity = opportunities.get(&spec.kind)?;
            Ok(AllocationLine {
                share: spec.share,
                kind: spec.kind.clone(),
                yield_per_year_perc: opportunity.yield_per_year_perc,
                value: spec.share * pool_total,
            })
        })
        .collect::<Result<Vec<_>, FireError>>()?;
    Ok(AllocationTable { lines })
}

pub fn weighted_average_yield(table: &AllocationTable) -> Result<f64, FireError> {
    table.weighted_average_yield()
}

#[derive(Debug, Clone)]
pub struct Portfolio {
    /// Initial assets, invested once.
    pub fixed: AllocationTable,
    /// Monthly contribution, re-invested every period.
    pub recurring: AllocationTable,
    pub initial_assets: f64,
    pub monthly_contribution: f64,
    pub recurring_yearly_growth_perc: f64,
}

impl Portfolio {
    pub fn new(
        opportunities: &OpportunityCatalog,
        fixed_allocation: &[AllocationSpec],
        recurring_allocation: &[AllocationSpec],
        initial_assets: f64,
        monthly_contribution: f64,
        recurring_yearly_growth_perc: f64,
    ) -> Result<Self, FireError> {
        let fixed = assemble(opportunities, fixed_allocation, initial_assets)?;
        let recurring = assemble(opportunities, recurring_allocation, monthly_contribution)?;
        // Retired withdrawals need at least one table to draw from.
        if fixed.total_share() == 0.0 && recurring.total_share() == 0.0 {
            return Err(FireError::DegenerateAllocation);
        }
        Ok(Self {
            fixed,
            recurring,
            initial_assets,
            monthly_contribution,
            recurring_yearly_growth_perc,
        })
    }

    pub fn fixed_average_yield(&self) -> Result<f64, FireError> {
        self.fixed.weighted_average_yield()
    }

    pub fn recurring_average_yield(&self) -> Result<f64, FireError> {
        self.recurring.weighted_average_yield()
    }

    pub fn fixed_line_yields(&self) -> Vec<f64> {
        self.fixed
            .lines
            .iter()
            .map(|line| line.yield_per_year_perc)
            .collect()
    }

    pub fn recurring_line_yields(&self) -> Vec<f64> {
        self.recurring
            .lines
            .iter()
            .map(|line| line.yield_per_year_perc)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> OpportunityCatalog {
        OpportunityCatalog::new()
            .with("A", 5.0)
            .with("B", 10.0)
            .with("STOCKS", 7.0)
    }

    #[test]
    fn assemble_sets_value_from_share_and_pool() {
        let table = assemble(
            &catalog(),
            &[AllocationSpec::new(0.6, "A"), AllocationSpec::new(0.4, "B")],
            10_000.0,
        )
        .expect("known types");

        assert_eq!(table.lines.len(), 2);
        assert!((table.lines[0].value - 6_000.0).abs() <= 1e-9);
        assert!((table.lines[1].value - 4_000.0).abs() <= 1e-9);
        assert!((table.lines[1].yield_per_year_perc - 10.0).abs() <= 1e-12);
        assert!((weighted_average_yield(&table).expect("non-degenerate") - 7.0).abs() <= 1e-12);
    }

    #[test]
    fn assemble_fails_on_unknown_type() {
        let err = assemble(
            &catalog(),
            &[AllocationSpec::new(0.5, "A"), AllocationSpec::new(0.5, "CRYPTO")],
            1_000.0,
        )
        .expect_err("CRYPTO is not in the catalog");
        assert_eq!(err, FireError::UnknownOpportunityType("CRYPTO".to_string()));
    }

    #[test]
    fn portfolio_construction_aborts_on_any_unknown_type() {
        let result = Portfolio::new(
            &catalog(),
            &[AllocationSpec::new(1.0, "STOCKS")],
            &[AllocationSpec::new(1.0, "GOLD")],
            50_000.0,
            1_000.0,
            2.0,
        );
        assert!(matches!(result, Err(FireError::UnknownOpportunityType(kind)) if kind == "GOLD"));
    }

    #[test]
    fn portfolio_needs_one_non_degenerate_table() {
        let lump_only = Portfolio::new(
            &catalog(),
            &[AllocationSpec::new(1.0, "STOCKS")],
            &[],
            50_000.0,
            0.0,
            0.0,
        )
        .expect("fixed pool alone is enough");
        assert_eq!(lump_only.recurring_average_yield(), Err(FireError::DegenerateAllocation));

        let empty = Portfolio::new(
            &catalog(),
            &[AllocationSpec::new(0.0, "STOCKS")],
            &[],
            50_000.0,
            1_000.0,
            0.0,
        );
        assert!(matches!(empty, Err(FireError::DegenerateAllocation)));
    }

    #[test]
    fn portfolio_exposes_average_and_line_yields() {
        let portfolio = Portfolio::new(
            &catalog(),
            &[AllocationSpec::new(1.0, "STOCKS")],
            &[AllocationSpec::new(0.6, "A"), AllocationSpec::new(0.4, "B")],
            50_000.0,
            1_000.0,
            2.0,
        )
        .expect("valid portfolio");

        assert_eq!(portfolio.fixed_average_yield(), Ok(7.0));
        assert!((portfolio.recurring_average_yield().expect("non-degenerate") - 7.0).abs() <= 1e-12);
        assert_eq!(portfolio.recurring_line_yields(), vec![5.0, 10.0]);
        assert_eq!(portfolio.fixed_line_yields(), vec![7.0]);
        assert!((portfolio.recurring.total_value() - 1_000.0).abs() <= 1e-9);
    }
}
