use clap::Parser;
use pressroom_client::PressroomClient;
use uuid::Uuid;

#[derive(Parser, Debug)]
struct Cli {
    #[clap(short, long)]
    server: Option<String>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Parser, Debug)]
enum Command {
    Register {
        #[clap(long)]
        name: String,
        #[clap(long)]
        email: String,
        #[clap(long)]
        password: String,
    },
    Login {
        #[clap(long)]
        email: String,
        #[clap(long)]
        password: String,
    },
    ListPosts,
    GetPost {
        id: Uuid,
    },
    CreatePost {
        #[clap(long)]
        title: String,
        #[clap(long)]
        content: String,
    },
    UpdatePost {
        id: Uuid,
        #[clap(long)]
        title: String,
        #[clap(long)]
        content: String,
    },
    ApprovePost {
        id: Uuid,
    },
    PublishPost {
        id: Uuid,
    },
    UnpublishPost {
        id: Uuid,
    },
    DeletePost {
        id: Uuid,
    },
    AddComment {
        id: Uuid,
        #[clap(long)]
        content: String,
    },
    ListComments {
        id: Uuid,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Cli::parse();

    let endpoint = args.server.as_deref().unwrap_or("http://127.0.0.1:8080");
    let mut client = PressroomClient::connect(endpoint)?;

    match args.command {
        Command::Register {
            name,
            email,
            password,
        } => {
            client.register(&name, &email, &password).await?;
            println!("registered and logged in as {}", email);
        }
        Command::Login { email, password } => {
            client.login(&email, &password).await?;
            println!("logged in as {}", email);
        }
        Command::ListPosts => {
            let posts = client.list_posts().await?;
            println!("{}", serde_json::to_string_pretty(&posts)?);
        }
        Command::GetPost { id } => {
            let post = client.get_post(id).await?;
            println!("{}", serde_json::to_string_pretty(&post)?);
        }
        Command::CreatePost { title, content } => {
            let post = client.create_post(&title, &content).await?;
            println!("{}", serde_json::to_string_pretty(&post)?);
        }
        Command::UpdatePost { id, title, content } => {
            let post = client.update_post(id, &title, &content).await?;
            println!("{}", serde_json::to_string_pretty(&post)?);
        }
        Command::ApprovePost { id } => {
            let post = client.approve_post(id).await?;
            println!("{}", serde_json::to_string_pretty(&post)?);
        }
        Command::PublishPost { id } => {
            let post = client.publish_post(id).await?;
            println!("{}", serde_json::to_string_pretty(&post)?);
        }
        Command::UnpublishPost { id } => {
            let post = client.unpublish_post(id).await?;
            println!("{}", serde_json::to_string_pretty(&post)?);
        }
        Command::DeletePost { id } => {
            client.delete_post(id).await?;
            println!("deleted {}", id);
        }
        Command::AddComment { id, content } => {
            let comment = client.add_comment(id, &content).await?;
            println!("{}", serde_json::to_string_pretty(&comment)?);
        }
        Command::ListComments { id } => {
            let comments = client.list_comments(id).await?;
            println!("{}", serde_json::to_string_pretty(&comments)?);
        }
    }

    Ok(())
}
