//! Negotiation demo: score a listing, pick a strategy and haggle with a scripted seller
//!
//! This example walks through the buyer workflow:
//! 1. Score a listing against comparable sales
//! 2. Preview bounds for every strategy tier
//! 3. Open a negotiation and respond to seller counters round by round
//! 4. Show the negotiation history
//!
//! Run with: cargo run --example negotiation_demo

use dealscout::negotiation::{RecommendedAction, SellerResponse, StrategyTier};
use dealscout::scoring::{DealScorer, FeeSchedule, MarketEstimate};
use dealscout::{round_amount, Listing, NegotiationEngine};
use rust_decimal_macros::dec;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("info,dealscout=debug")
        .init();

    println!("\n╔══════════════════════════════════════════════╗");
    println!("║   DealScout Negotiation Demo                 ║");
    println!("╚══════════════════════════════════════════════╝\n");

    let listing = Listing::new("demo_1", "Herman Miller Aeron, size B", 500)?
        .with_condition("used - good")
        .with_age_days(9);

    // =========================================================================
    // Scenario 1: Deal scoring
    // =========================================================================
    println!("┌─────────────────────────────────────────────┐");
    println!("│ Scenario 1: Deal Scoring                    │");
    println!("└─────────────────────────────────────────────┘");

    let scorer = DealScorer::default();
    let estimate = MarketEstimate::from_samples(dec!(640), Some(dec!(620)), 14, scorer.config());
    let analysis = scorer.score(&listing, Some(&estimate), &FeeSchedule::ebay())?;

    println!("   Asking:     ${}", listing.asking_price);
    println!("   Market avg: ${} ({} sales)", estimate.average, estimate.sample_size);
    println!("   Score:      {:.1} -> {}", analysis.score, analysis.rating);
    println!("   {}\n", analysis.reason);

    // =========================================================================
    // Scenario 2: Bounds per tier
    // =========================================================================
    println!("┌─────────────────────────────────────────────┐");
    println!("│ Scenario 2: Strategy Tiers                  │");
    println!("└─────────────────────────────────────────────┘");

    let engine = NegotiationEngine::default();
    let market_average = round_amount(estimate.average);

    for tier in StrategyTier::ALL {
        let bounds = engine.compute_bounds(
            listing.asking_price,
            Some(market_average),
            Some(analysis.rating),
            Some(tier),
            listing.listing_age_days,
        )?;
        println!(
            "   {:<20} open ${:<4} target ${:<4} walk away ${}",
            tier.name(),
            bounds.initial_offer,
            bounds.target_price,
            bounds.walk_away_price
        );
    }

    let suggested = engine.compute_bounds(
        listing.asking_price,
        Some(market_average),
        Some(analysis.rating),
        None,
        listing.listing_age_days,
    )?;
    println!("   Suggested tier: {}\n", suggested.tier.name());

    // =========================================================================
    // Scenario 3: Multi-round negotiation
    // =========================================================================
    println!("┌─────────────────────────────────────────────┐");
    println!("│ Scenario 3: Multi-Round Negotiation         │");
    println!("└─────────────────────────────────────────────┘");

    let mut outcome = engine.open(
        &listing,
        Some(market_average),
        None,
        Some(StrategyTier::Moderate),
    )?;
    let id = outcome.negotiation_id.clone();
    let seller_counters = [470u64, 440, 425];

    for counter in seller_counters {
        let amount = match (outcome.recommended_action(), outcome.recommended_amount()) {
            (RecommendedAction::WalkAway, _) | (_, None) => break,
            (_, Some(amount)) => amount,
        };
        println!("   💬 Buyer:  ${}", amount);
        let message = format!("Would you take ${}?", amount);
        outcome = engine.send_offer(&id, outcome.round_number, amount, message)?;

        println!("   💬 Seller: ${}", counter);
        outcome = engine.advance_negotiation(
            &id,
            outcome.round_number,
            &SellerResponse::counter(format!("Best I can do is ${}", counter), counter),
        )?;
        println!(
            "      -> round {}: {} {:?}",
            outcome.round_number,
            outcome.recommended_action(),
            outcome.recommended_amount()
        );

        if outcome.state.is_terminal() {
            break;
        }
    }

    if let Some(amount) = outcome.recommended_amount().filter(|_| outcome.state.is_active()) {
        let message = format!("${} and I can pick up today", amount);
        outcome = engine.send_offer(&id, outcome.round_number, amount, message)?;
        let response = SellerResponse::acceptance("Deal!");
        outcome = engine.advance_negotiation(&id, outcome.round_number, &response)?;
    }
    println!("   ✅ Final state: {}\n", outcome.state);

    // =========================================================================
    // Scenario 4: History
    // =========================================================================
    println!("┌─────────────────────────────────────────────┐");
    println!("│ Scenario 4: Negotiation History             │");
    println!("└─────────────────────────────────────────────┘");

    let progress = engine.progress(&id)?;
    println!("   Buyer offers:    {:?}", progress.buyer_offers);
    println!("   Seller counters: {:?}", progress.seller_counters);
    println!("   Messages:        {}", progress.messages_exchanged);
    println!("   Agreed price:    {:?}\n", engine.get_state(&id)?.agreed_price);

    Ok(())
}
