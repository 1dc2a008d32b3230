//! Terminal front-end for SmartHub.

use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, MultiSelect, Password, Select};
use smarthub_connector::{
    Announcement, AnswerValue, ApiError, Attempt, AttemptEvent, AttemptPhase, ClientConfig, Course,
    Difficulty, Internship, LearningResource, Project, Question, QuestionType, Quiz, QuizAttempt,
    QuizBackend, QuizGenerationRequest, ReqwestTransport, ResourcePage, RestResource, Role, Session,
    SmartHubCredentials, Ticker, Transport,
};
use std::collections::BTreeSet;
use std::error::Error;
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::time::Duration;

fn main() {
    pretty_env_logger::init();
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let config = ClientConfig::load()?;
    let transport: Arc<dyn Transport> = Arc::new(ReqwestTransport::new(config.request_timeout())?);
    let theme = ColorfulTheme::default();
    let session = open_session(&config, transport, &theme)?;
    println!(
        "Welcome, {} ({})",
        session.user().display_name(),
        session.role()
    );

    loop {
        let mut items = vec![
            "Courses",
            "Announcements",
            "Projects",
            "Internships",
            "Learning resources",
        ];
        if session.role() == Role::Student {
            items.extend(["Take a quiz", "Quiz history", "Recommendations"]);
        } else {
            items.push("Generate a quiz");
        }
        items.extend(["Logout", "EXIT"]);

        let selection = Select::with_theme(&theme)
            .with_prompt("Choose an action")
            .items(&items)
            .default(0)
            .interact()?;

        match items[selection] {
            "Courses" => show_page::<Course>(&session, |c| {
                format!("{} ({} credits, {})", c.display_name(), c.credits, c.teacher_label())
            }),
            "Announcements" => show_page::<Announcement>(&session, |a| {
                format!("{} - {}\n    {}", a.title, a.posted_label(), a.excerpt(80))
            }),
            "Projects" => show_page::<Project>(&session, |p| {
                format!("{} [{}] due {}", p.title, p.status.label(), p.deadline_label())
            }),
            "Internships" => show_page::<Internship>(&session, |i| {
                format!(
                    "{} at {} ({}), {} weeks, {}",
                    i.title,
                    i.company,
                    i.location_label(),
                    i.duration_weeks(),
                    i.status.label()
                )
            }),
            "Learning resources" => show_page::<LearningResource>(&session, |r| {
                format!("{} [{}] {}", r.title, r.kind.label(), r.url)
            }),
            "Take a quiz" => {
                if let Err(e) = take_quiz(&session, &config, &theme) {
                    println!("Quiz stopped: {}", e);
                }
            }
            "Quiz history" => show_history(&session),
            "Recommendations" => show_recommendations(&session),
            "Generate a quiz" => {
                if let Err(e) = generate_quiz(&session, &theme) {
                    println!("Quiz generation stopped: {}", e);
                }
            }
            "Logout" => {
                if let Err(e) = SmartHubCredentials::clear_system() {
                    log::warn!("{}", e);
                }
                if let Err(e) = session.logout() {
                    println!("{}", e.user_message());
                }
                return Ok(());
            }
            _ => return Ok(()),
        }
    }
}

fn open_session(
    config: &ClientConfig,
    transport: Arc<dyn Transport>,
    theme: &ColorfulTheme,
) -> Result<Session, Box<dyn Error>> {
    if let Some(credentials) = SmartHubCredentials::load() {
        match Session::resume(Arc::clone(&transport), &credentials) {
            Ok(session) => return Ok(session),
            Err(e) => log::warn!("Stored credentials rejected: {}", e),
        }
    }

    loop {
        let username: String = Input::with_theme(theme)
            .with_prompt("Username")
            .interact_text()?;
        let password = Password::with_theme(theme)
            .with_prompt("Password")
            .interact()?;

        match Session::login(Arc::clone(&transport), &config.base_url, &username, &password) {
            Ok(session) => {
                if let Err(e) = session.credentials().store_in_system() {
                    log::warn!("Could not remember credentials: {}", e);
                }
                return Ok(session);
            }
            Err(ApiError::Connection(e)) => return Err(Box::new(ApiError::Connection(e))),
            Err(ApiError::Unauthorized) => println!("Incorrect username or password"),
            Err(e) => println!("{}", e.user_message()),
        }
    }
}

fn show_page<R: RestResource>(session: &Session, describe: impl Fn(&R) -> String) {
    let mut page = ResourcePage::<R>::new();
    if !page.refresh(session) {
        println!("{}", page.error().unwrap_or_default());
        return;
    }
    if page.items().is_empty() {
        println!("No {}s yet.", R::LABEL);
    }
    for item in page.items() {
        println!("#{:<5} {}", item.id(), describe(item));
    }
}

fn show_history(session: &Session) {
    match session.api().fetch_attempt_history(session.user().id) {
        Ok(attempts) => {
            for attempt in attempts {
                println!(
                    "Attempt #{} on quiz #{}: {} - {}",
                    attempt.id,
                    attempt.quiz_id,
                    attempt.status.label(),
                    attempt.score_label()
                );
            }
        }
        Err(e) => println!("{}", e.user_message()),
    }
}

fn show_recommendations(session: &Session) {
    match session.api().fetch_recommendations(session.user().id) {
        Ok(items) if items.is_empty() => println!("Nothing to recommend right now."),
        Ok(items) => {
            for item in items {
                println!("[{}] {}", item.kind_label(), item.title);
                if let Some(reason) = &item.reason {
                    println!("    {}", reason);
                }
            }
        }
        Err(e) => println!("{}", e.user_message()),
    }
}

fn take_quiz(
    session: &Session,
    config: &ClientConfig,
    theme: &ColorfulTheme,
) -> Result<(), Box<dyn Error>> {
    let quiz_id: u64 = Input::with_theme(theme)
        .with_prompt("Quiz id")
        .interact_text()?;

    let mut attempt = QuizAttempt::new(session.api(), config.quiz_duration());
    if let Err(e) = attempt.begin(quiz_id, session.user()) {
        println!("{}", e.user_message());
        return Ok(());
    }
    if attempt.state().phase == AttemptPhase::Completed {
        println!("You already completed this quiz.");
        if let Some(result) = attempt.results() {
            print_results(result);
        }
        return Ok(());
    }

    let quiz: Quiz = match attempt.quiz() {
        Some(quiz) => quiz.clone(),
        None => return Ok(()),
    };
    println!("{} ({} questions)", quiz.title, quiz.questions.len());

    let (sender, receiver) = mpsc::channel();
    let mut ticker = Ticker::start(Duration::from_secs(1), sender, || AttemptEvent::Tick);

    'answering: loop {
        for question in &quiz.questions {
            if !drain_ticks(&mut attempt, &receiver) {
                break 'answering;
            }
            if attempt.state().timed_out {
                break;
            }
            println!("[{} left]", attempt.state().remaining_label());
            if let Err(e) = ask_question(&mut attempt, &receiver, question, theme) {
                println!("Could not read the answer: {}", e);
            }
        }

        if !drain_ticks(&mut attempt, &receiver) {
            break;
        }
        let prompt = if attempt.state().timed_out {
            "Time is up. Your answers are locked".to_string()
        } else {
            format!(
                "{}/{} answered, {} left",
                attempt.state().answered_count(),
                quiz.questions.len(),
                attempt.state().remaining_label()
            )
        };
        let (choice, prompt_failed) = match Select::with_theme(theme)
            .with_prompt(prompt)
            .items(&["Submit", "Review answers"])
            .default(0)
            .interact()
        {
            Ok(choice) => (choice, false),
            Err(e) => {
                println!("Could not read your choice ({}), submitting your answers", e);
                (0, true)
            }
        };
        if !drain_ticks(&mut attempt, &receiver) {
            break;
        }
        if choice == 0 {
            match attempt.submit() {
                Ok(()) => break,
                Err(e) => {
                    println!("Submission failed: {}", e.user_message());
                    attempt.dismiss_error();
                    if prompt_failed {
                        break;
                    }
                }
            }
        }
    }
    ticker.stop();

    match attempt.results() {
        Some(result) => print_results(result),
        None => {
            println!("Quiz not submitted. Resume it from the menu to try again.");
            attempt.unmount();
        }
    }
    Ok(())
}

/// Applies pending ticks. Returns `false` once the attempt has left the answering phase.
/// A failed auto-submit returns the attempt to `InProgress` with its answers locked, so the
/// student can still submit by hand.
fn drain_ticks<B>(attempt: &mut QuizAttempt<'_, B>, receiver: &Receiver<AttemptEvent>) -> bool
where
    B: QuizBackend + ?Sized,
{
    let was_timed_out = attempt.state().timed_out;
    attempt.drain_events(receiver);
    if attempt.state().timed_out && !was_timed_out {
        println!("Time is up!");
        if let Some(message) = attempt.state().error.clone() {
            println!("Automatic submission failed: {}", message);
            attempt.dismiss_error();
        }
    }
    attempt.state().phase == AttemptPhase::InProgress
}

/// Prompts for one answer and records it unless the countdown ran out while the prompt was open.
fn ask_question<B>(
    attempt: &mut QuizAttempt<'_, B>,
    receiver: &Receiver<AttemptEvent>,
    question: &Question,
    theme: &ColorfulTheme,
) -> Result<(), Box<dyn Error>>
where
    B: QuizBackend + ?Sized,
{
    let prompt = format!("{} ({})", question.text, question.question_type.label());
    let question_type = question.prompt_type();

    let recorded: Vec<String> = match question_type {
        QuestionType::SingleChoice | QuestionType::TrueFalse => {
            let current = question
                .options
                .iter()
                .position(|o| attempt.state().answers.is_selected(question.id, o))
                .unwrap_or(0);
            let selection = Select::with_theme(theme)
                .with_prompt(prompt)
                .items(&question.options)
                .default(current)
                .interact()?;
            vec![question.options[selection].clone()]
        }
        QuestionType::MultipleChoice => {
            let before: Vec<bool> = question
                .options
                .iter()
                .map(|o| attempt.state().answers.is_selected(question.id, o))
                .collect();
            let chosen: BTreeSet<usize> = MultiSelect::with_theme(theme)
                .with_prompt(prompt)
                .items(&question.options)
                .defaults(&before)
                .interact()?
                .into_iter()
                .collect();
            question
                .options
                .iter()
                .enumerate()
                .filter(|(index, _)| chosen.contains(index) != before[*index])
                .map(|(_, option)| option.clone())
                .collect()
        }
        QuestionType::OpenEnded => {
            let current = match attempt.state().answers.get(question.id) {
                Some(AnswerValue::Text(text)) => text.clone(),
                _ => String::new(),
            };
            let text: String = Input::with_theme(theme)
                .with_prompt(prompt)
                .with_initial_text(current)
                .allow_empty(true)
                .interact_text()?;
            vec![text.trim().to_string()]
        }
    };

    if !drain_ticks(attempt, receiver) || attempt.state().timed_out {
        println!("Answer not recorded: time is up.");
        return Ok(());
    }
    for value in recorded {
        attempt.record_answer(question.id, &value, question_type);
    }
    Ok(())
}

fn print_results(result: &Attempt) {
    println!(
        "Score: {} ({} of {} correct)",
        result.score_label(),
        result.correct_count(),
        result.answers.len()
    );
    for answer in &result.answers {
        let mark = match answer.is_correct {
            Some(true) => "✔",
            Some(false) => "✘",
            None => "?",
        };
        println!(
            "{} {}: {}",
            mark,
            answer.question_text.as_deref().unwrap_or("Question"),
            answer.answer_text
        );
        if answer.is_correct == Some(false) {
            if let Some(correct) = &answer.correct_answer {
                println!("    correct answer: {}", correct);
            }
        }
    }
}

fn generate_quiz(session: &Session, theme: &ColorfulTheme) -> Result<(), Box<dyn Error>> {
    if let Err(e) = session.require_role(Quiz::WRITE_ROLES) {
        println!("{}", e.user_message());
        return Ok(());
    }

    let topic: String = Input::with_theme(theme).with_prompt("Topic").interact_text()?;
    let question_count: u32 = Input::with_theme(theme)
        .with_prompt("Number of questions")
        .default(10)
        .interact_text()?;
    let difficulties = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];
    let labels: Vec<&str> = difficulties.iter().map(|d| d.label()).collect();
    let difficulty = Select::with_theme(theme)
        .with_prompt("Difficulty")
        .items(&labels)
        .default(1)
        .interact()?;
    let type_labels: Vec<&str> = QuestionType::ALL.iter().map(|t| t.label()).collect();
    let types = MultiSelect::with_theme(theme)
        .with_prompt("Question types")
        .items(&type_labels)
        .defaults(&[true; 4])
        .interact()?;

    let mut request = QuizGenerationRequest::new(&topic, question_count, difficulties[difficulty]);
    request.question_types = types.into_iter().map(|i| QuestionType::ALL[i]).collect();

    println!("Generating...");
    let mut draft = match session.api().generate_quiz(&request) {
        Ok(draft) => draft,
        Err(e) => {
            println!("{}", e.user_message());
            return Ok(());
        }
    };

    for (index, question) in draft.questions.iter().enumerate() {
        println!("{}. {} ({})", index + 1, question.text, question.question_type.label());
        for option in &question.options {
            println!("     - {}", option);
        }
    }

    let title: String = Input::with_theme(theme)
        .with_prompt("Quiz title")
        .with_initial_text(draft.title.clone())
        .interact_text()?;
    draft.rename(&title);

    if Confirm::with_theme(theme)
        .with_prompt("Save this quiz (inactive until published)?")
        .default(true)
        .interact()?
    {
        match session.api().create::<Quiz>(&draft.into_form(false)) {
            Ok(quiz) => println!("Saved quiz #{}", quiz.id),
            Err(e) => println!("{}", e.user_message()),
        }
    }
    Ok(())
}
