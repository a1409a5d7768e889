//! Typed configuration output, plus the built-in keyword handlers that
//! extract it from assembled command blocks.
//!
//! A handler gets a block's atoms flattened into one list with no line
//! markers between them, so sub-commands are recognized positionally by
//! their keywords. Unrecognized sub-commands are skipped, the same
//! forward-compatibility policy the assembler applies to unrecognized
//! top-level keywords.
use std::collections::BTreeMap;
use std::fmt;

use regex::Regex;

use super::assembler::Handlers;
use super::lexer::Token;

/// The accumulated device configuration.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Config {
    pub hostname: Option<String>,
    pub interfaces: BTreeMap<String, Interface>,
}

/// Settings gathered from one `interface` block.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Interface {
    pub nameif: Option<String>,
    pub security_level: Option<u16>,
    pub address: Option<IpAddress>,
    pub shutdown: bool,
}

/// A dotted-quad address and netmask pair, kept in source form.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct IpAddress {
    pub address: String,
    pub netmask: String,
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(hostname) = &self.hostname {
            writeln!(f, "hostname {}", hostname)?;
        }
        for (name, interface) in &self.interfaces {
            writeln!(f, "interface {} {}", name, interface)?;
        }
        Ok(())
    }
}

impl fmt::Display for Interface {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "nameif={}", self.nameif.as_deref().unwrap_or("-"))?;
        match self.security_level {
            Some(level) => write!(f, " security-level={}", level)?,
            None => write!(f, " security-level=-")?,
        }
        match &self.address {
            Some(ip) => write!(f, " address={}/{}", ip.address, ip.netmask)?,
            None => write!(f, " address=-")?,
        }
        write!(f, " {}", if self.shutdown { "down" } else { "up" })
    }
}

/// Builds the default keyword registry.
pub fn default_handlers() -> Handlers {
    let mut handlers = Handlers::new();
    handlers.insert("hostname".to_owned(), Box::new(handle_hostname));
    handlers.insert("interface".to_owned(), Box::new(handle_interface));
    handlers
}

/// `hostname <name>`
fn handle_hostname(command: &[Token], config: &mut Config) -> Result<(), String> {
    let mut args = command.iter().skip(1);
    config.hostname = Some(argument(&mut args, "hostname")?.to_owned());
    Ok(())
}

/// `interface <name>` and its indented sub-commands.
fn handle_interface(command: &[Token], config: &mut Config) -> Result<(), String> {
    let mut args = command.iter().skip(1);
    let name = argument(&mut args, "interface")?.to_owned();

    // Work on a copy so a malformed block leaves any earlier settings
    // for this interface untouched.
    let mut interface = config.interfaces.get(&name).cloned().unwrap_or_default();

    while let Some(token) = args.next() {
        match token.text() {
            "nameif" => {
                interface.nameif = Some(argument(&mut args, "nameif")?.to_owned());
            }
            "security-level" => {
                let text = argument(&mut args, "security-level")?;
                let level = u16::from_str_radix(text, 10)
                    .map_err(|_| format!("security-level must be numeric, got `{}`", text))?;
                if level > 100 {
                    return Err(format!("security-level must be 0-100, got {}", level));
                }
                interface.security_level = Some(level);
            }
            "ip" => {
                let sub = argument(&mut args, "ip")?;
                if sub != "address" {
                    return Err(format!("unsupported ip sub-command `{}`", sub));
                }
                let address = dotted_quad(argument(&mut args, "ip address")?)?;
                let netmask = dotted_quad(argument(&mut args, "ip address netmask")?)?;
                interface.address = Some(IpAddress { address, netmask });
            }
            "shutdown" => interface.shutdown = true,
            "no" => {
                if let Some(next) = args.next() {
                    if next.text() == "shutdown" {
                        interface.shutdown = false;
                    }
                }
            }
            _ => {}
        }
    }

    config.interfaces.insert(name, interface);
    Ok(())
}

/// The next atom of the block, or an error naming the sub-command that
/// needed it.
fn argument<'a, I>(args: &mut I, what: &str) -> Result<&'a str, String>
where
    I: Iterator<Item = &'a Token>,
{
    match args.next() {
        Some(token) => Ok(token.text()),
        None => Err(format!(
            "expected an argument after `{}`, got end of block",
            what
        )),
    }
}

/// Validates a dotted-quad address or netmask and returns it unchanged.
fn dotted_quad(text: &str) -> Result<String, String> {
    let shape = Regex::new(r"^(\d{1,3})\.(\d{1,3})\.(\d{1,3})\.(\d{1,3})$").unwrap();
    let octets = match shape.captures(text) {
        Some(captures) => captures,
        None => return Err(format!("`{}` is not a dotted-quad address", text)),
    };

    for index in 1..=4 {
        let octet = &octets[index];
        if u8::from_str_radix(octet, 10).is_err() {
            return Err(format!("octet `{}` in `{}` is out of range", octet, text));
        }
    }

    Ok(text.to_owned())
}

#[cfg(test)]
mod tests {
    use super::super::parse;
    use super::*;
    use std::io;

    fn atoms(texts: &[&str]) -> Vec<Token> {
        texts.iter().map(|t| Token::Atom((*t).to_owned())).collect()
    }

    /// A reader that serves its data and then fails instead of
    /// reporting a clean end of stream.
    struct FailingReader {
        data: &'static [u8],
        pos: usize,
    }

    impl io::Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.pos >= self.data.len() {
                return Err(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "stream went away",
                ));
            }
            let n = buf.len().min(self.data.len() - self.pos);
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    #[test]
    fn test_handle_hostname() {
        let mut config = Config::default();
        let command = atoms(&["hostname", "fw1"]);

        assert_eq!(handle_hostname(&command, &mut config), Ok(()));
        assert_eq!(config.hostname, Some("fw1".to_owned()));

        assert!(handle_hostname(&atoms(&["hostname"]), &mut config).is_err());
    }

    #[test]
    fn test_handle_interface_full_block() {
        let mut config = Config::default();
        let command = atoms(&[
            "interface",
            "GigabitEthernet0/0",
            "nameif",
            "outside",
            "security-level",
            "0",
            "ip",
            "address",
            "192.0.2.1",
            "255.255.255.0",
            "no",
            "shutdown",
        ]);

        assert_eq!(handle_interface(&command, &mut config), Ok(()));
        assert_eq!(
            config.interfaces.get("GigabitEthernet0/0"),
            Some(&Interface {
                nameif: Some("outside".to_owned()),
                security_level: Some(0),
                address: Some(IpAddress {
                    address: "192.0.2.1".to_owned(),
                    netmask: "255.255.255.0".to_owned(),
                }),
                shutdown: false,
            })
        );
    }

    #[test]
    fn test_handle_interface_requires_name() {
        let mut config = Config::default();
        assert!(handle_interface(&atoms(&["interface"]), &mut config).is_err());
        assert!(config.interfaces.is_empty());
    }

    #[test]
    fn test_security_level_range() {
        let mut config = Config::default();

        let command = atoms(&["interface", "Vlan1", "security-level", "caramel"]);
        assert!(handle_interface(&command, &mut config).is_err());

        let command = atoms(&["interface", "Vlan1", "security-level", "101"]);
        assert!(handle_interface(&command, &mut config).is_err());

        let command = atoms(&["interface", "Vlan1", "security-level", "100"]);
        assert_eq!(handle_interface(&command, &mut config), Ok(()));
        assert_eq!(
            config.interfaces.get("Vlan1").unwrap().security_level,
            Some(100)
        );
    }

    #[test]
    fn test_malformed_block_leaves_earlier_settings() {
        let mut config = Config::default();

        let good = atoms(&["interface", "Vlan1", "nameif", "inside"]);
        assert_eq!(handle_interface(&good, &mut config), Ok(()));

        let bad = atoms(&["interface", "Vlan1", "security-level", "caramel"]);
        assert!(handle_interface(&bad, &mut config).is_err());

        assert_eq!(
            config.interfaces.get("Vlan1").unwrap().nameif,
            Some("inside".to_owned())
        );
    }

    #[test]
    fn test_unknown_subcommands_skipped() {
        let mut config = Config::default();
        let command = atoms(&["interface", "Vlan1", "speed", "1000", "shutdown"]);

        assert_eq!(handle_interface(&command, &mut config), Ok(()));
        let interface = config.interfaces.get("Vlan1").unwrap();
        assert!(interface.shutdown);
        assert_eq!(interface.nameif, None);
    }

    #[test]
    fn test_dotted_quad() {
        assert_eq!(dotted_quad("192.0.2.1"), Ok("192.0.2.1".to_owned()));
        assert_eq!(
            dotted_quad("255.255.255.0"),
            Ok("255.255.255.0".to_owned())
        );
        assert!(dotted_quad("192.0.2").is_err());
        assert!(dotted_quad("192.0.2.999").is_err());
        assert!(dotted_quad("outside").is_err());
        assert!(dotted_quad("192.0.2.1.5").is_err());
    }

    #[test]
    fn test_parse_end_to_end() {
        let input = "interface GigabitEthernet0/0\n nameif outside\n security-level 0\n ip address 192.0.2.1 255.255.255.0\n!\nhostname fw1\n";
        let config = parse(input.as_bytes(), default_handlers()).unwrap();

        assert_eq!(config.hostname, Some("fw1".to_owned()));
        assert_eq!(
            config.interfaces.get("GigabitEthernet0/0"),
            Some(&Interface {
                nameif: Some("outside".to_owned()),
                security_level: Some(0),
                address: Some(IpAddress {
                    address: "192.0.2.1".to_owned(),
                    netmask: "255.255.255.0".to_owned(),
                }),
                shutdown: false,
            })
        );
    }

    #[test]
    fn test_parse_is_idempotent() {
        let input = "hostname fw1\ninterface Vlan1\n nameif inside\n security-level 100\n";
        let first = parse(input.as_bytes(), default_handlers()).unwrap();
        let second = parse(input.as_bytes(), default_handlers()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_parse_reports_read_failure() {
        let reader = FailingReader {
            data: b"interface GigabitEthernet0/0\n nameif outs",
            pos: 0,
        };

        let result = parse(reader, default_handlers());

        match result {
            Err(message) => assert!(message.contains("stream went away"), "got: {}", message),
            Ok(config) => panic!("expected a failed parse, got {:?}", config),
        }
    }

    #[test]
    fn test_parse_comment_and_blank_only_input_is_empty() {
        let input = "! saved configuration\n!\n\n   \n! end\n";
        let config = parse(input.as_bytes(), default_handlers()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_display_rendering() {
        let input = "hostname fw1\ninterface Vlan1\n nameif inside\n security-level 100\n shutdown\n";
        let config = parse(input.as_bytes(), default_handlers()).unwrap();
        assert_eq!(
            config.to_string(),
            "hostname fw1\ninterface Vlan1 nameif=inside security-level=100 address=- down\n"
        );
    }

    #[test]
    fn test_lexer_assembler_composition_matches_manual_tokens() {
        // The same block fed through the full pipeline and built by
        // hand must produce identical configurations.
        let input = "interface Vlan1\n nameif dmz\n";
        let piped = parse(input.as_bytes(), default_handlers()).unwrap();

        let mut manual = Config::default();
        handle_interface(&atoms(&["interface", "Vlan1", "nameif", "dmz"]), &mut manual).unwrap();

        assert_eq!(piped, manual);
    }
}
