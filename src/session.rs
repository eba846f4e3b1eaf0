//! Line commands for the interactive session.
//!
//! Each input line parses into a [`SessionCommand`]; [`apply`] runs it
//! against the workflow and returns the text to show the operator.

use crate::selection::Listing;
use crate::workflow::Workflow;

/// A parsed operator command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// List available commands.
    Help,
    /// Replace the search text (empty clears it).
    Search(String),
    /// Select one record by id.
    Select(String),
    /// Use the select-all / deselect-all toggle.
    All,
    /// Clear the selection.
    None,
    /// Drop a record from the selection.
    Remove(String),
    /// Drop a record from escrow without fixing it.
    Dismiss(String),
    /// Hand an escrowed record to the editor.
    Fix(String),
    /// Hide the escrow view.
    CloseEscrow,
    /// Set the recipient.
    To(String),
    /// Set the subject.
    Subject(String),
    /// Overwrite the body (`\n` escapes become newlines).
    Body(String),
    /// Print the current state.
    Show,
    /// Hand the message to transport.
    Send,
    /// Dismiss the workflow.
    Quit,
}

/// Whether the session loop should keep reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep going.
    Continue,
    /// Stop the loop.
    Quit,
}

/// Parse one input line.
///
/// # Errors
///
/// Returns a human-readable message for unknown commands or missing
/// arguments.
pub fn parse(line: &str) -> Result<SessionCommand, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let required = |name: &str| -> Result<String, String> {
        if rest.is_empty() {
            Err(format!("usage: {name} <value>"))
        } else {
            Ok(rest.to_owned())
        }
    };

    match word {
        "help" | "?" => Ok(SessionCommand::Help),
        "search" => Ok(SessionCommand::Search(rest.to_owned())),
        "select" => required("select").map(SessionCommand::Select),
        "all" => Ok(SessionCommand::All),
        "none" => Ok(SessionCommand::None),
        "remove" => required("remove").map(SessionCommand::Remove),
        "dismiss" => required("dismiss").map(SessionCommand::Dismiss),
        "fix" => required("fix").map(SessionCommand::Fix),
        "close-escrow" => Ok(SessionCommand::CloseEscrow),
        "to" => Ok(SessionCommand::To(rest.to_owned())),
        "subject" => Ok(SessionCommand::Subject(rest.to_owned())),
        "body" => Ok(SessionCommand::Body(rest.replace("\\n", "\n"))),
        "show" | "" => Ok(SessionCommand::Show),
        "send" => Ok(SessionCommand::Send),
        "quit" | "exit" => Ok(SessionCommand::Quit),
        other => Err(format!("unknown command: {other} (try `help`)")),
    }
}

/// Command summary.
pub fn help_text() -> String {
    [
        "Commands:",
        "  search <text>     filter by name (empty clears)",
        "  select <id>       select a client",
        "  all               select all / deselect all",
        "  none              clear the selection",
        "  remove <id>       unselect a client",
        "  dismiss <id>      drop a client from the missing-ID list",
        "  fix <id>          edit a client missing an ID",
        "  close-escrow      hide the missing-ID list",
        "  to <email>        set the recipient",
        "  subject <text>    set the subject",
        "  body <text>       overwrite the body (\\n for newlines)",
        "  show              print the current state",
        "  send              send and close",
        "  quit              close without sending",
    ]
    .join("\n")
}

/// Run `command` against `workflow`, returning the output and loop control.
pub fn apply(workflow: &mut Workflow, command: SessionCommand) -> (String, Flow) {
    let output = match command {
        SessionCommand::Help => help_text(),
        SessionCommand::Search(text) => {
            workflow.set_filter(&text);
            render_state(workflow)
        }
        SessionCommand::Select(id) => {
            if workflow.toggle_id(&id) {
                render_state(workflow)
            } else {
                format!("no client with id {id}")
            }
        }
        SessionCommand::All => {
            workflow.toggle_all();
            render_state(workflow)
        }
        SessionCommand::None => {
            workflow.deselect_all();
            render_state(workflow)
        }
        SessionCommand::Remove(id) => {
            workflow.remove(&id);
            render_state(workflow)
        }
        SessionCommand::Dismiss(id) => {
            workflow.remove_from_escrow(&id);
            render_state(workflow)
        }
        SessionCommand::Fix(id) => {
            if workflow.request_remediation_id(&id) {
                format!("editing {id}; save the roster file to continue")
            } else {
                format!("{id} is not waiting for an identifier")
            }
        }
        SessionCommand::CloseEscrow => {
            workflow.close_escrow_view();
            render_state(workflow)
        }
        SessionCommand::To(recipient) => {
            workflow.set_recipient(&recipient);
            render_state(workflow)
        }
        SessionCommand::Subject(subject) => {
            workflow.set_subject(&subject);
            render_state(workflow)
        }
        SessionCommand::Body(body) => {
            workflow.set_body(&body);
            render_state(workflow)
        }
        SessionCommand::Show => render_state(workflow),
        SessionCommand::Send => {
            if workflow.send() {
                return ("sent".to_owned(), Flow::Quit);
            }
            "cannot send yet: needs a recipient, a subject and at least one selected client"
                .to_owned()
        }
        SessionCommand::Quit => {
            workflow.close();
            return ("closed".to_owned(), Flow::Quit);
        }
    };
    (output, Flow::Continue)
}

/// Render the workflow state for the terminal.
pub fn render_state(workflow: &Workflow) -> String {
    let engine = workflow.engine();
    let mut out = String::with_capacity(1024);

    out.push_str(&format!("[{:?}]", workflow.phase()));
    if !engine.filter().is_empty() {
        out.push_str(&format!(" search: {}", engine.filter()));
    }
    let toggle = if engine.all_eligible_selected() { "[x]" } else { "[ ]" };
    out.push_str(&format!("  all {toggle}\n"));

    render_listing(&mut out, &engine.listing());

    if engine.escrow_shown() {
        if let Some(mode) = engine.escrow_mode() {
            out.push_str(&format!("\n{}:\n", mode.title()));
        }
        for record in engine.escrowed() {
            out.push_str(&format!("  {} {}\n", record.id, record.display_name));
        }
    }

    let draft = workflow.draft();
    out.push_str(&format!("\nTo: {}\n", draft.recipient));
    out.push_str(&format!("CC: {}\n", draft.cc_address));
    out.push_str(&format!("Subject: {}\n\n", draft.subject));
    out.push_str(&draft.body);
    out.push('\n');
    out
}

fn render_listing(out: &mut String, listing: &Listing<'_>) {
    if listing.is_empty() {
        out.push_str("  (no clients)\n");
        return;
    }
    for record in &listing.needs_identifier {
        out.push_str(&format!("  {} {}  (sin identificación)\n", record.id, record.display_name));
    }
    for record in &listing.eligible {
        out.push_str(&format!(
            "  {} {} - {}\n",
            record.id,
            record.display_name,
            record.identifier_str()
        ));
    }
    for record in &listing.selected {
        out.push_str(&format!(
            "* {} {} - {}\n",
            record.id,
            record.display_name,
            record.identifier_str()
        ));
    }
}
