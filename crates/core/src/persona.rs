//! Persona configuration for the seed message.
//!
//! The seed preamble is assembled from three independent dials, so
//! presets are plain configuration values rather than separate
//! front-end variants.

/// The narrative role of the bot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StoryRole {
    /// Gathers story details from the kid, one question at a time.
    #[default]
    Storyteller,
    /// An expert pair programmer.
    PairProgrammer,
    /// No role preamble at all.
    NoContext,
}

impl StoryRole {
    fn preamble(self) -> &'static str {
        match self {
            StoryRole::Storyteller => {
                "You are gathering information for a story for kids in \
                 middle school. The kids will give you details, and you \
                 need to ask them only one question every time to \
                 continue the story. Please keep your response in a \
                 format where the summary and question are separated."
            }
            StoryRole::PairProgrammer => {
                "You are an expert pair programmer helping build an AI \
                 bot application with chat-completion and \
                 speech-to-text APIs."
            }
            StoryRole::NoContext => "",
        }
    }
}

/// The personality of the bot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Personality {
    /// Cracks jokes frequently.
    #[default]
    Quirky,
    /// Surprising, with the personality of a mercurial 7 years old.
    Weird,
    /// Concise and accurate, no frills.
    StraightLaced,
}

impl Personality {
    fn preamble(self) -> &'static str {
        match self {
            Personality::Quirky => {
                "You are quirky with a sense of humor. You crack jokes \
                 frequently in your responses."
            }
            Personality::Weird => {
                "You are weird, you like to surprise the kid with your \
                 responses and have the personality of a mercurial 7 \
                 years old."
            }
            Personality::StraightLaced => {
                "You are a straight laced corporate executive and only \
                 provide concise and accurate information."
            }
        }
    }
}

/// How long the bot's replies should be.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Brevity {
    /// 1 to 2 sentences.
    #[default]
    Brief,
    /// 3 to 4 sentences.
    Long,
    /// 5 to 6 sentences.
    Whimsical,
}

impl Brevity {
    fn preamble(self) -> &'static str {
        match self {
            Brevity::Brief => "Your responses are always 1 to 2 sentences.",
            Brevity::Long => "Your responses are always 3 to 4 sentences.",
            Brevity::Whimsical => {
                "Your responses are always 5 to 6 sentences."
            }
        }
    }
}

/// The persona carried by the seed message of every conversation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Persona {
    /// The narrative role dial.
    pub role: StoryRole,
    /// The personality dial.
    pub personality: Personality,
    /// The brevity dial.
    pub brevity: Brevity,
}

impl Persona {
    /// Renders the seed message content for this persona.
    pub fn seed_content(&self) -> String {
        [
            self.role.preamble(),
            self.personality.preamble(),
            self.brevity.preamble(),
        ]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
    }
}
