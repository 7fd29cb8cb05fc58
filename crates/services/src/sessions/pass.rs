use hanja_core::model::Hanja;
use rand::Rng;
use rand::seq::SliceRandom;

/// One sweep over a shuffled card list. Cards before `cursor` are resolved.
#[derive(Debug, Clone, Default)]
pub(crate) struct Pass {
    cards: Vec<Hanja>,
    cursor: usize,
    number: u32,
}

impl Pass {
    /// Shuffle `cards`, then keep at most `limit` of them.
    pub(crate) fn build<R: Rng + ?Sized>(
        mut cards: Vec<Hanja>,
        number: u32,
        limit: Option<usize>,
        rng: &mut R,
    ) -> Self {
        cards.as_mut_slice().shuffle(rng);
        if let Some(limit) = limit {
            cards.truncate(limit);
        }
        Self {
            cards,
            cursor: 0,
            number,
        }
    }

    pub(crate) fn current(&self) -> Option<&Hanja> {
        self.cards.get(self.cursor)
    }

    pub(crate) fn advance(&mut self) {
        if self.cursor < self.cards.len() {
            self.cursor += 1;
        }
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.cursor >= self.cards.len()
    }

    pub(crate) fn total(&self) -> usize {
        self.cards.len()
    }

    pub(crate) fn resolved(&self) -> usize {
        self.cursor
    }

    pub(crate) fn remaining(&self) -> &[Hanja] {
        &self.cards[self.cursor.min(self.cards.len())..]
    }

    /// 1 for the initial pass, 2+ for review passes.
    pub(crate) fn number(&self) -> u32 {
        self.number
    }

    pub(crate) fn is_review(&self) -> bool {
        self.number > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hanja_core::model::{HanjaDraft, HanjaId};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn cards(n: u64) -> Vec<Hanja> {
        (1..=n)
            .map(|id| {
                HanjaDraft {
                    character: format!("字{id}"),
                    sound: "자".into(),
                    meaning: "글자".into(),
                    stroke_order: Vec::new(),
                    examples: Vec::new(),
                    chapter: 1,
                    difficulty: 2,
                }
                .validate()
                .unwrap()
                .assign_id(HanjaId::from_number(id))
            })
            .collect()
    }

    #[test]
    fn shuffle_keeps_every_card_once() {
        let mut rng = StdRng::seed_from_u64(7);
        let pass = Pass::build(cards(10), 1, None, &mut rng);
        let mut ids: Vec<_> = pass.remaining().iter().filter_map(|h| h.id.numeric()).collect();
        ids.sort_unstable();
        assert_eq!(ids, (1..=10).collect::<Vec<_>>());
    }

    #[test]
    fn limit_truncates_after_shuffle() {
        let mut rng = StdRng::seed_from_u64(7);
        let pass = Pass::build(cards(30), 1, Some(20), &mut rng);
        assert_eq!(pass.total(), 20);
    }

    #[test]
    fn cursor_stops_at_end() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut pass = Pass::build(cards(2), 2, None, &mut rng);
        assert!(pass.is_review());
        pass.advance();
        pass.advance();
        pass.advance();
        assert!(pass.is_finished());
        assert_eq!(pass.resolved(), 2);
        assert!(pass.current().is_none());
        assert!(pass.remaining().is_empty());
    }
}
