// The persisted tournament document and the merge that loads it.
//
// Saved documents may come from an older build or a hand-edited backup, so
// loading never trusts their shape: every record is laid over the default
// record for the same slot, and anything the current layout does not know is
// dropped.

use std::collections::BTreeMap;

use anyhow::{bail, Context};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::bracket::{standard_matches, BracketGraph, Match, MatchId};
use crate::roster::{Player, Roster, TeamId};
use crate::scoring::ScoringSession;

/// Schema version written into new documents.
pub const DOCUMENT_VERSION: u32 = 1;

/// Everything needed to rebuild a tournament.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub version: u32,
    pub bracket: BTreeMap<MatchId, Match>,
    pub players: BTreeMap<TeamId, Vec<Player>>,
    pub scorer: Option<ScoringSession>,
    pub champion: Option<TeamId>,
}

impl Default for Document {
    fn default() -> Self {
        Document::snapshot(&BracketGraph::standard(), &Roster::default(), None)
    }
}

impl Document {
    pub fn snapshot(
        bracket: &BracketGraph,
        roster: &Roster,
        scorer: Option<&ScoringSession>,
    ) -> Self {
        Document {
            version: DOCUMENT_VERSION,
            bracket: bracket
                .matches()
                .iter()
                .map(|m| (m.id.clone(), m.clone()))
                .collect(),
            players: roster.clone().into_teams(),
            scorer: scorer.cloned(),
            champion: bracket.champion().cloned(),
        }
    }

    /// Parse a saved document, filling gaps from the defaults.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let value: Value = serde_json::from_str(json).context("Saved document is not valid JSON")?;
        Self::from_value(value)
    }

    pub fn from_value(saved: Value) -> anyhow::Result<Self> {
        let Value::Object(mut saved) = saved else {
            bail!("Saved document must be a JSON object");
        };
        let defaults = Document::default();

        let mut bracket = BTreeMap::new();
        let mut saved_bracket = take_object(&mut saved, "bracket");
        for (id, default) in &defaults.bracket {
            let patch = saved_bracket.remove(id);
            let mut m = merge_record(default, patch.as_ref(), &format!("match {id}"))?;
            m.id = id.clone();
            bracket.insert(id.clone(), m);
        }
        for unknown in saved_bracket.keys() {
            debug!("Dropping unknown match {} from saved document", unknown);
        }

        let mut players = BTreeMap::new();
        let mut saved_players = take_object(&mut saved, "players");
        for (team, default_squad) in &defaults.players {
            let patches = match saved_players.remove(team) {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            };
            let mut squad = Vec::with_capacity(default_squad.len().max(patches.len()));
            for (i, default) in default_squad.iter().enumerate() {
                let what = format!("player {i} of team {team}");
                let mut player: Player = merge_record(default, patches.get(i), &what)?;
                // Squad position decides identity.
                player.id = default.id.clone();
                player.team_id = team.clone();
                squad.push(player);
            }
            players.insert(team.clone(), squad);
        }

        let champion = match saved.remove("champion") {
            Some(Value::String(team)) if players.contains_key(&team) => Some(team),
            _ => None,
        };

        let scorer = match saved.remove("scorer") {
            None | Some(Value::Null) => None,
            Some(value) => match serde_json::from_value::<ScoringSession>(value) {
                Ok(s) if bracket.contains_key(&s.match_id) && players.contains_key(&s.batting_team) => {
                    Some(s)
                }
                Ok(s) => {
                    warn!("Dropping saved scoring session for unknown match {}", s.match_id);
                    None
                }
                Err(e) => {
                    warn!("Dropping malformed saved scoring session: {}", e);
                    None
                }
            },
        };

        Ok(Document {
            version: DOCUMENT_VERSION,
            bracket,
            players,
            scorer,
            champion,
        })
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize tournament document")
    }

    /// Rebuild engine state. Matches come back in layout order.
    pub(crate) fn into_parts(mut self) -> (BracketGraph, Roster, Option<ScoringSession>) {
        let matches = standard_matches()
            .into_iter()
            .map(|default| self.bracket.remove(&default.id).unwrap_or(default))
            .collect();
        let bracket = BracketGraph::restore(matches, self.champion);
        (bracket, Roster::from_teams(self.players), self.scorer)
    }
}

fn take_object(map: &mut Map<String, Value>, key: &str) -> Map<String, Value> {
    match map.remove(key) {
        Some(Value::Object(inner)) => inner,
        _ => Map::new(),
    }
}

/// Decode `default` with `patch` laid over it. If the merged record does not
/// decode, the patch is applied one top-level field at a time and every field
/// that breaks the record is dropped with a warning.
fn merge_record<T>(default: &T, patch: Option<&Value>, what: &str) -> anyhow::Result<T>
where
    T: Clone + Serialize + DeserializeOwned,
{
    let Some(patch) = patch else {
        return Ok(default.clone());
    };
    let base = serde_json::to_value(default)?;
    let mut merged = base.clone();
    overlay(&mut merged, patch);
    if let Ok(record) = serde_json::from_value(merged) {
        return Ok(record);
    }
    let Value::Object(fields) = patch else {
        warn!("Ignoring malformed saved {}", what);
        return Ok(default.clone());
    };

    let mut record = base;
    for (key, value) in fields {
        let mut attempt = record.clone();
        overlay(&mut attempt, &Value::Object(Map::from_iter([(key.clone(), value.clone())])));
        match serde_json::from_value::<T>(attempt.clone()) {
            Ok(_) => record = attempt,
            Err(e) => warn!("Dropping field {} of saved {}: {}", key, what, e),
        }
    }
    serde_json::from_value(record).with_context(|| format!("Saved {what} is malformed"))
}

/// Lay `patch` over `base` field by field. Nested objects merge recursively;
/// a null in the patch never erases a value the base has.
fn overlay(base: &mut Value, patch: &Value) {
    let (Value::Object(base), Value::Object(patch)) = (base, patch) else {
        return;
    };
    for (key, value) in patch {
        if let Some(existing) = base.get_mut(key) {
            if value.is_null() && !existing.is_null() {
                continue;
            }
            if existing.is_object() && value.is_object() {
                overlay(existing, value);
                continue;
            }
        }
        base.insert(key.clone(), value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::{MatchScores, MatchStatus, Overs, TossDecision};
    use serde_json::json;

    fn played() -> Document {
        let mut bracket = BracketGraph::standard();
        let mut roster = Roster::default();
        bracket.complete_match("M1", "A", "B", MatchScores::default()).unwrap();
        bracket.set_toss("M2", "C", TossDecision::Bat).unwrap();
        roster.update_player("A", "A_0", Some("Rohan"), None).unwrap();
        roster.player_mut("A", "A_0").unwrap().batting.runs = 44;
        Document::snapshot(&bracket, &roster, None)
    }

    #[test]
    fn default_document_matches_layout() {
        let doc = Document::default();
        assert_eq!(doc.version, DOCUMENT_VERSION);
        assert_eq!(doc.bracket.len(), 8);
        assert_eq!(doc.players.len(), 6);
        assert!(doc.scorer.is_none());
        assert!(doc.champion.is_none());
    }

    #[test]
    fn round_trip_preserves_everything() {
        let doc = played();
        let back = Document::from_json(&doc.to_json().unwrap()).unwrap();
        assert_eq!(back, doc);
        let (bracket, roster, _) = back.into_parts();
        assert_eq!(bracket.get("SF1").unwrap().team1.as_deref(), Some("A"));
        assert_eq!(roster.player("A", "A_0").unwrap().name, "Rohan");
    }

    #[test]
    fn empty_object_loads_defaults() {
        let doc = Document::from_value(json!({})).unwrap();
        assert_eq!(doc, Document::default());
    }

    #[test]
    fn non_object_is_rejected() {
        assert!(Document::from_value(json!([1, 2, 3])).is_err());
        assert!(Document::from_json("not json").is_err());
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let doc = Document::from_value(json!({
            "theme": "dark",
            "bracket": { "M9": { "label": "Exhibition" } },
            "players": { "Z": [] },
        }))
        .unwrap();
        assert_eq!(doc, Document::default());
    }

    #[test]
    fn partial_match_takes_field_defaults() {
        let doc = Document::from_value(json!({
            "bracket": {
                "M1": { "status": "done", "winner": "B", "loser": "A", "score1": 80, "overs1": "8.0" },
                "E1": { "team1": "A" }
            }
        }))
        .unwrap();
        let m1 = &doc.bracket["M1"];
        assert_eq!(m1.status, MatchStatus::Done);
        assert_eq!(m1.team1.as_deref(), Some("A"));
        assert_eq!(m1.label, "Match 1");
        assert_eq!(m1.score1, Some(80));
        assert_eq!(m1.score2, None);
        assert_eq!(doc.bracket["E1"].team1.as_deref(), Some("A"));
        assert_eq!(doc.bracket["E1"].status, MatchStatus::Locked);
    }

    #[test]
    fn null_never_erases_seeding() {
        let doc = Document::from_value(json!({
            "bracket": { "M3": { "team1": null, "team2": "F" } }
        }))
        .unwrap();
        assert_eq!(doc.bracket["M3"].team1.as_deref(), Some("E"));
    }

    #[test]
    fn partial_players_take_field_defaults() {
        let doc = Document::from_value(json!({
            "players": {
                "D": [ { "name": "Kavya", "batting": { "runs": 12 } } ]
            }
        }))
        .unwrap();
        let squad = &doc.players["D"];
        assert_eq!(squad.len(), 11);
        assert_eq!(squad[0].name, "Kavya");
        assert_eq!(squad[0].id, "D_0");
        assert_eq!(squad[0].batting.runs, 12);
        assert_eq!(squad[0].batting.balls_faced, 0);
        assert_eq!(squad[1].name, "Player 2");
    }

    #[test]
    fn numeric_overs_load() {
        let doc = Document::from_value(json!({
            "bracket": {
                "M1": {
                    "status": "done", "winner": "A", "loser": "B",
                    "score1": 120, "score2": 100, "overs1": 8, "overs2": 0
                }
            }
        }))
        .unwrap();
        let m1 = &doc.bracket["M1"];
        assert_eq!(m1.status, MatchStatus::Done);
        assert_eq!(m1.winner.as_deref(), Some("A"));
        assert_eq!((m1.score1, m1.score2), (Some(120), Some(100)));
        assert_eq!(m1.overs1, Some(Overs::new(8, 0).unwrap()));
        assert_eq!(m1.overs2, Some(Overs::default()));
    }

    #[test]
    fn bad_field_does_not_cost_other_progress() {
        let mut saved = serde_json::to_value(played()).unwrap();
        saved["bracket"]["M3"]["overs1"] = json!("eight");
        saved["bracket"]["M3"]["label"] = json!("Third");
        saved["bracket"]["M2"]["status"] = json!("finished");
        saved["players"]["A"][1]["role"] = json!("WICKETKEEPER");
        saved["players"]["A"][1]["name"] = json!("Ishan");

        let doc = Document::from_value(saved).unwrap();
        let m1 = &doc.bracket["M1"];
        assert_eq!(m1.status, MatchStatus::Done);
        assert_eq!(m1.winner.as_deref(), Some("A"));
        assert_eq!(doc.bracket["M2"].toss_winner.as_deref(), Some("C"));
        assert_eq!(doc.bracket["M2"].status, MatchStatus::Pending);
        assert_eq!(doc.bracket["SF1"].team1.as_deref(), Some("A"));
        // Only the broken field goes; its siblings stay.
        assert_eq!(doc.bracket["M3"].overs1, None);
        assert_eq!(doc.bracket["M3"].label, "Third");
        assert_eq!(doc.players["A"][0].batting.runs, 44);
        assert_eq!(doc.players["A"][1].name, "Ishan");
        assert_eq!(doc.players["A"][1].role, Document::default().players["A"][1].role);
    }

    #[test]
    fn player_identity_follows_squad_position() {
        let doc = Document::from_value(json!({
            "players": {
                "B": [ { "id": "A_0", "teamId": "A", "name": "Nikhil" } ]
            }
        }))
        .unwrap();
        let first = &doc.players["B"][0];
        assert_eq!(first.name, "Nikhil");
        assert_eq!(first.id, "B_0");
        assert_eq!(first.team_id, "B");
        assert_eq!(doc.players["A"][0].name, "Player 1");
    }

    #[test]
    fn malformed_scorer_is_dropped() {
        let doc = Document::from_value(json!({
            "scorer": { "matchId": "M1", "innings": 1 },
            "champion": "A"
        }))
        .unwrap();
        assert!(doc.scorer.is_none());
        assert_eq!(doc.champion.as_deref(), Some("A"));
    }

    #[test]
    fn unknown_champion_is_dropped() {
        let doc = Document::from_value(json!({ "champion": "Q" })).unwrap();
        assert!(doc.champion.is_none());
    }
}
