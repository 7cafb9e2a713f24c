//! Population compartments.

use core::fmt;

/// A mutually exclusive population state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Compartment {
    Susceptible,
    Exposed,
    Waiting,
    Infected,
    Fatal,
    Recovered,
}

impl Compartment {
    pub const ALL: [Compartment; 6] = [
        Compartment::Susceptible,
        Compartment::Exposed,
        Compartment::Waiting,
        Compartment::Infected,
        Compartment::Fatal,
        Compartment::Recovered,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Compartment::Susceptible => "susceptible",
            Compartment::Exposed => "exposed",
            Compartment::Waiting => "waiting",
            Compartment::Infected => "infected",
            Compartment::Fatal => "fatal",
            Compartment::Recovered => "recovered",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        Self::ALL.into_iter().find(|c| c.name() == lower)
    }

    /// Compartments not yet counted as confirmed cases.
    pub fn is_pre_confirmed(self) -> bool {
        matches!(
            self,
            Compartment::Susceptible | Compartment::Exposed | Compartment::Waiting
        )
    }
}

impl fmt::Display for Compartment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for c in Compartment::ALL {
            assert_eq!(Compartment::from_name(c.name()), Some(c));
        }
        assert_eq!(
            Compartment::from_name("Infected"),
            Some(Compartment::Infected)
        );
        assert_eq!(Compartment::from_name("hospitalized"), None);
    }

    #[test]
    fn pre_confirmed_set() {
        assert!(Compartment::Exposed.is_pre_confirmed());
        assert!(!Compartment::Infected.is_pre_confirmed());
        assert!(!Compartment::Recovered.is_pre_confirmed());
    }
}
