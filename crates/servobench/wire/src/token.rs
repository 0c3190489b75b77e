// Servobench
// Copyright (C) 2026 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

use std::fmt;

/// The two motor channels of a bench rig.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    M0,
    M1,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::M0, Channel::M1];

    /// Zero-based index, handy for array-per-channel state.
    pub fn index(self) -> usize {
        match self {
            Channel::M0 => 0,
            Channel::M1 => 1,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::M0 => f.write_str("m0"),
            Channel::M1 => f.write_str("m1"),
        }
    }
}

/// Control tokens of the line protocol. Each renders as a two-byte `$x`
/// line on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    /// Rig asks for the proportional gain of a channel.
    KpPrompt(Channel),
    /// Rig asks for the position setpoint of a channel.
    SetpointPrompt(Channel),
    /// Rig asks for the sample period in milliseconds.
    PeriodPrompt,
    /// Start of a channel's sample stream.
    DataBegin(Channel),
    /// End of a channel's sample stream.
    DataEnd(Channel),
}

impl Token {
    pub fn as_str(self) -> &'static str {
        match self {
            Token::KpPrompt(Channel::M0) => "$a",
            Token::KpPrompt(Channel::M1) => "$b",
            Token::SetpointPrompt(Channel::M0) => "$c",
            Token::SetpointPrompt(Channel::M1) => "$d",
            Token::PeriodPrompt => "$e",
            Token::DataBegin(Channel::M0) => "$f",
            Token::DataEnd(Channel::M0) => "$g",
            Token::DataBegin(Channel::M1) => "$h",
            Token::DataEnd(Channel::M1) => "$i",
        }
    }

    /// Parse a trimmed protocol line as a token.
    pub fn from_line(line: &str) -> Option<Token> {
        match line {
            "$a" => Some(Token::KpPrompt(Channel::M0)),
            "$b" => Some(Token::KpPrompt(Channel::M1)),
            "$c" => Some(Token::SetpointPrompt(Channel::M0)),
            "$d" => Some(Token::SetpointPrompt(Channel::M1)),
            "$e" => Some(Token::PeriodPrompt),
            "$f" => Some(Token::DataBegin(Channel::M0)),
            "$g" => Some(Token::DataEnd(Channel::M0)),
            "$h" => Some(Token::DataBegin(Channel::M1)),
            "$i" => Some(Token::DataEnd(Channel::M1)),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(Token::KpPrompt(Channel::M0), "$a")]
    #[test_case(Token::KpPrompt(Channel::M1), "$b")]
    #[test_case(Token::SetpointPrompt(Channel::M0), "$c")]
    #[test_case(Token::SetpointPrompt(Channel::M1), "$d")]
    #[test_case(Token::PeriodPrompt, "$e")]
    #[test_case(Token::DataBegin(Channel::M0), "$f")]
    #[test_case(Token::DataEnd(Channel::M0), "$g")]
    #[test_case(Token::DataBegin(Channel::M1), "$h")]
    #[test_case(Token::DataEnd(Channel::M1), "$i")]
    fn token_maps_both_ways(token: Token, wire: &str) {
        assert_eq!(token.as_str(), wire);
        assert_eq!(Token::from_line(wire), Some(token));
        assert_eq!(token.to_string(), wire);
    }

    #[test]
    fn unknown_lines_are_not_tokens() {
        assert_eq!(Token::from_line("$z"), None);
        assert_eq!(Token::from_line(""), None);
        assert_eq!(Token::from_line("100"), None);
        assert_eq!(Token::from_line("$a extra"), None);
    }

    #[test]
    fn channel_indices_are_stable() {
        assert_eq!(Channel::M0.index(), 0);
        assert_eq!(Channel::M1.index(), 1);
        assert_eq!(Channel::ALL.len(), 2);
        assert_eq!(Channel::M0.to_string(), "m0");
        assert_eq!(Channel::M1.to_string(), "m1");
    }
}
