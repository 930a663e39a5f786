//! Probability and bet-sizing math for moneyline sniping.

/// Convert American odds (-110, +150) to implied probability (0.0 to 1.0).
///
/// Includes the book's vig; pair with [`devig_two_way`] when both sides of
/// the moneyline are available.
pub fn american_to_implied_prob(odds: f64) -> f64 {
    if odds > 0.0 {
        100.0 / (odds + 100.0)
    } else {
        odds.abs() / (odds.abs() + 100.0)
    }
}

/// Remove vig from a two-outcome market using proportional normalization.
///
/// Returns `(0.0, 0.0)` when both implied probabilities are zero.
pub fn devig_two_way(odds_a: f64, odds_b: f64) -> (f64, f64) {
    let p_a = american_to_implied_prob(odds_a);
    let p_b = american_to_implied_prob(odds_b);
    let total = p_a + p_b;
    if total == 0.0 {
        return (0.0, 0.0);
    }
    (p_a / total, p_b / total)
}

/// Kelly fraction from edge and payout ratio (b). Non-positive payout yields 0.
pub fn kelly_fraction(edge: f64, payout: f64) -> f64 {
    if payout <= 0.0 {
        return 0.0;
    }
    (edge / payout).max(0.0)
}

/// Dollar stake from bankroll, edge, payout ratio, and a fractional-Kelly
/// multiplier.
pub fn kelly_bet_size(bankroll: f64, edge: f64, payout: f64, multiplier: f64) -> f64 {
    let fraction = kelly_fraction(edge, payout);
    (bankroll * fraction * multiplier).max(0.0)
}

/// Net payout ratio of a binary contract priced at `price_prob` (0.0 to 1.0).
///
/// A 40 cent contract pays 60 cents of profit on a win: b = (1 - p) / p.
pub fn binary_payout(price_prob: f64) -> f64 {
    if price_prob <= 0.0 {
        return 0.0;
    }
    (1.0 - price_prob) / price_prob
}

/// Whole contracts purchasable for `stake_dollars` at `price_cents`.
pub fn contracts_for_stake(stake_dollars: f64, price_cents: i64) -> i64 {
    if price_cents <= 0 {
        return 0;
    }
    let price_dollars = price_cents as f64 / 100.0;
    (stake_dollars / price_dollars).floor() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_implied_prob_favorites_and_dogs() {
        // -150 favorite: 150 / 250 = 0.60
        assert!((american_to_implied_prob(-150.0) - 0.60).abs() < 1e-9);
        // +150 underdog: 100 / 250 = 0.40
        assert!((american_to_implied_prob(150.0) - 0.40).abs() < 1e-9);
        // Even odds quoted as -100
        assert!((american_to_implied_prob(-100.0) - 0.50).abs() < 1e-9);
    }

    #[test]
    fn test_devig_sums_to_one() {
        // Standard -110 / -110 line carries ~4.5% vig
        let (p_home, p_away) = devig_two_way(-110.0, -110.0);
        assert!((p_home + p_away - 1.0).abs() < 1e-9);
        assert!((p_home - 0.5).abs() < 1e-9);

        let (p_fav, p_dog) = devig_two_way(-150.0, 130.0);
        assert!((p_fav + p_dog - 1.0).abs() < 1e-9);
        assert!(p_fav > p_dog);
    }

    #[test]
    fn test_devig_degenerate() {
        // Unreachable with real odds, but the guard must hold
        let (a, b) = devig_two_way(f64::INFINITY, f64::INFINITY);
        assert_eq!((a, b), (0.0, 0.0));
    }

    #[test]
    fn test_kelly_fraction() {
        assert_eq!(kelly_fraction(0.10, 0.0), 0.0);
        assert_eq!(kelly_fraction(-0.05, 1.5), 0.0);
        assert!((kelly_fraction(0.10, 2.0) - 0.05).abs() < 1e-9);
    }

    #[test]
    fn test_kelly_bet_size() {
        // 10% edge at b=1.0 with half-Kelly on $100: 100 * 0.10 * 0.5 = $5
        let stake = kelly_bet_size(100.0, 0.10, 1.0, 0.5);
        assert!((stake - 5.0).abs() < 1e-9);

        // Negative edge never produces a stake
        assert_eq!(kelly_bet_size(100.0, -0.10, 1.0, 0.5), 0.0);
    }

    #[test]
    fn test_binary_payout() {
        // 50c contract doubles the stake on a win
        assert!((binary_payout(0.50) - 1.0).abs() < 1e-9);
        // 40c contract: b = 0.6 / 0.4 = 1.5
        assert!((binary_payout(0.40) - 1.5).abs() < 1e-9);
        assert_eq!(binary_payout(0.0), 0.0);
    }

    #[test]
    fn test_contracts_for_stake() {
        // $2 at 50c = 4 contracts
        assert_eq!(contracts_for_stake(2.0, 50), 4);
        // $2 at 45c = 4 contracts (floor of 4.44)
        assert_eq!(contracts_for_stake(2.0, 45), 4);
        // $2 at 67c = 2 contracts
        assert_eq!(contracts_for_stake(2.0, 67), 2);
        assert_eq!(contracts_for_stake(2.0, 0), 0);
    }
}
